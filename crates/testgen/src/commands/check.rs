//! Check command - validate template names and section structure

use crate::context::expand_patterns;
use crate::output::print_success;
use anyhow::Result;
use colored::Colorize;
use testgen_core::Generator;

pub fn run(patterns: Vec<String>, verbose: bool) -> Result<()> {
    let templates = expand_patterns(&patterns)?;

    if verbose {
        for template in &templates {
            println!("{} Checking {}", "→".cyan(), template.display());
        }
    }

    Generator::check(&templates)?;

    print_success(&format!("{} template(s) OK", templates.len()))?;

    Ok(())
}
