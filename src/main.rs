use clap::Parser;
use std::process;

use tasktime::cli;
use tasktime::cli::commands::{Cli, Commands};

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TASKTIME_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    if let Err(e) = init_tracing(cli_args.verbose) {
        eprintln!("warning: {e:#}");
    }

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Ticket(cmd) => cli::ticket::run(cmd, json_output),
        Commands::Task(cmd) => cli::task::run(cmd, json_output),
        Commands::Term(cmd) => cli::term::run(cmd, json_output),
        Commands::Track { task, seconds, autostart } => cli::track::run(&task, seconds, autostart, json_output),
        Commands::Config(cmd) => cli::config::run(cmd, json_output),
    };

    process::exit(exit_code);
}
