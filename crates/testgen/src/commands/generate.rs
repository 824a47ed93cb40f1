//! Generate command - expand templates into the test-suite tree

use crate::context::{Context, expand_patterns};
use crate::output::{print_json, print_success, print_text, print_warning};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use testgen_core::Generator;

/// Flags of the `generate` subcommand
pub struct GenerateOptions {
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub include: Vec<PathBuf>,
    pub toolchain_check: bool,
    pub json: bool,
}

/// Generate the test suite for every template matched by `patterns`
///
/// # Arguments
///
/// * `options` - Configuration path and generation flags
/// * `patterns` - Template paths or glob patterns
/// * `verbose` - Enable verbose output if true
pub fn run(options: GenerateOptions, patterns: Vec<String>, verbose: bool) -> Result<()> {
    let ctx = Context::load(&options.config, verbose)?;

    if options.toolchain_check {
        ctx.config.verify_toolchain()?;
    }

    let templates = expand_patterns(&patterns)?;
    if ctx.verbose && !options.json {
        println!(
            "{} Generating from {} template(s)",
            "→".cyan(),
            templates.len()
        );
    }

    let mut generator = Generator::new(ctx.config);
    if let Some(dir) = options.output {
        generator = generator.with_output_dir(dir);
    }
    if !options.include.is_empty() {
        generator = generator.with_include_paths(options.include);
    }

    let report = generator.run(&templates)?;

    if options.json {
        return print_json(&report);
    }

    for file in &report.files {
        match file.expect {
            Some(code) => print_success(&format!("{} (expect {})", file.path.display(), code))?,
            None => print_success(&file.path.display().to_string())?,
        }
    }

    if report.files.is_empty() {
        print_warning("No files generated")?;
    } else {
        print_text("")?;
        print_success(&format!(
            "Generated {} file(s) in {}",
            report.files.len(),
            report.output_dir.display()
        ))?;
    }

    Ok(())
}
