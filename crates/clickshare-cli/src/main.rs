//! clickshare CLI - query-level estimates of page-level analytics metrics.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Process {
            file,
            roles,
            breakdown,
            no_date,
            aggregate,
            mode,
            config,
            delimiter,
            output,
            format,
            summary_json,
        } => commands::process::run(commands::process::ProcessArgs {
            file,
            roles: roles.into_partial(breakdown),
            no_date,
            aggregate,
            mode,
            config,
            delimiter,
            output,
            format,
            summary_json,
            verbose: cli.verbose,
        }),

        Commands::Columns { file, json } => commands::columns::run(file, json, cli.verbose),

        Commands::Init { file, output } => commands::init::run(file, output, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
