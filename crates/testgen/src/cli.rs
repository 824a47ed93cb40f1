//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "testgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a test suite from templates
    Generate {
        /// Configuration file (.toml or JSON)
        #[arg(short, long, env = "TESTGEN_CONFIG")]
        config: PathBuf,

        /// Output directory, overriding `testdir` from the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Additional include directory (repeatable)
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,

        /// Skip checking that the compiler is on PATH
        #[arg(long)]
        no_toolchain_check: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Template files or glob patterns (*.tt)
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Check template syntax without generating anything
    Check {
        /// Template files or glob patterns (*.tt)
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// List the predefined macros for a configuration
    Macros {
        /// Configuration file (.toml or JSON)
        #[arg(short, long, env = "TESTGEN_CONFIG")]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
