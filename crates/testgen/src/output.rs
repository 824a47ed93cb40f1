//! Stdout helpers shared by commands

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Write `value` as pretty-printed JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")?;
    Ok(())
}

pub fn print_text(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

pub fn print_success(s: &str) -> io::Result<()> {
    print_text(&format!("{} {}", "✓".green().bold(), s))
}

pub fn print_warning(s: &str) -> io::Result<()> {
    print_text(&format!("{} {}", "!".yellow(), s))
}
