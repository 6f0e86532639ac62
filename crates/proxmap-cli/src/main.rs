//! proxmap - raster proximity map generator

use clap::Parser;
use proxmap_cli::{run, Args};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn setup_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Usage errors exit with clap's status 2.
    let args = Args::parse();
    setup_logging(args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
