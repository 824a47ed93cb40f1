mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            output,
            include,
            no_toolchain_check,
            json,
            patterns,
        } => commands::generate::run(
            commands::generate::GenerateOptions {
                config,
                output,
                include,
                toolchain_check: !no_toolchain_check,
                json,
            },
            patterns,
            cli.verbose,
        ),
        Commands::Check { patterns } => commands::check::run(patterns, cli.verbose),
        Commands::Macros { config, json } => commands::macros::run(config, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
