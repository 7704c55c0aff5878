use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use taskgraph::cli;
use taskgraph::cli::commands::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("TASKGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli_args = Cli::parse();
    let json = cli_args.json;

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json),
        Commands::Plan(cmd) => cli::plan::run(cmd, json),
        Commands::Task(cmd) => cli::task::run(cmd, json),
        Commands::Ready { limit } => cli::query::run_ready(limit, json),
        Commands::Blocked => cli::query::run_blocked(json),
        Commands::Stats => cli::query::run_stats(json),
        Commands::Doctor => cli::doctor::run(json),
    };

    process::exit(exit_code);
}
