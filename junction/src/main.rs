use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;
mod logging;
mod statsd;

use config::Config;

#[derive(Parser)]
#[command(name = "junction", version, about = "Paginates and joins upstream REST collections")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the aggregator
    Run(ConfigArgs),
    /// Validate a config file and exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        CliCommand::Run(args) => run(&args.config_file),
        CliCommand::CheckConfig(args) => check_config(&args.config_file),
    }
}

fn check_config(path: &Path) -> ExitCode {
    match Config::load(path) {
        Ok(config) => {
            println!(
                "{}: ok, {} route(s)",
                path.display(),
                config.aggregator.routes.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> ExitCode {
    // Logging is configured by the file, so failures up to here go to stderr.
    let config = match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let logging_config = config.logging.clone().unwrap_or_default();
    let _sentry = match logging::init(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("invalid sentry DSN: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(metrics_config) = &config.metrics
        && let Err(e) = statsd::init(metrics_config)
    {
        tracing::error!(error = %e, "Failed to set up metrics");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting junction");
    match runtime.block_on(aggregator::run(config.aggregator)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Aggregator stopped");
            ExitCode::FAILURE
        }
    }
}
