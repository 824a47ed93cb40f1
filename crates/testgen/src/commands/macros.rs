//! Macros command - show the predefined macros for a configuration

use crate::context::Context;
use crate::output::{print_json, print_success, print_text};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use testgen_core::predefined::predefined_macros;

#[derive(Debug, Serialize)]
struct MacroEntry {
    name: String,
    value: String,
}

pub fn run(config: PathBuf, json: bool, verbose: bool) -> Result<()> {
    let ctx = Context::load(&config, verbose)?;
    let env = predefined_macros(&ctx.config)?;

    let entries: Vec<MacroEntry> = env
        .iter()
        .map(|mac| MacroEntry {
            name: mac.name().to_string(),
            value: mac.body().to_string(),
        })
        .collect();

    if json {
        return print_json(&entries);
    }

    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &entries {
        let name = format!("{:width$}", entry.name, width = width);
        print_text(&format!("{}  {}", name.bold(), entry.value))?;
    }

    if ctx.verbose {
        print_text("")?;
        print_success(&format!("{} macro(s)", entries.len()))?;
    }

    Ok(())
}
