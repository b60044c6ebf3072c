//! timedresolve - resolve one hostname within a fixed deadline
//!
//! Prints `host:<ip>` for every address found, diagnostics go to stderr.
//! Exits 0 whether or not the name resolved.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use timedresolve::runner::{PoolRunner, RunnerConfig};

const DEFAULT_HOSTNAME: &str = "www.google.com";
const PORT: &str = "80";

#[derive(Debug, Parser)]
#[command(name = "timedresolve", version, about)]
struct CliArgs {
    /// Hostname to resolve
    #[arg(default_value = DEFAULT_HOSTNAME)]
    hostname: String,
}

fn setup_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(args: &CliArgs) -> Result<()> {
    let runner = PoolRunner::with_config(RunnerConfig::default())?;
    runner.start(&args.hostname, PORT);
    // Dropping the runner releases keep-alive and joins the workers once
    // the race is over.
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = setup_logging() {
        eprintln!("failed to set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "setup failed");
            ExitCode::FAILURE
        }
    }
}
