//! `crewctl` binary.
//!
//! Reads `.env` if present, then `CREWAI_*` variables, then flags.
//! `RUST_LOG` overrides the log filter.

use std::process::ExitCode;

use clap::Parser;
use crewctl::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn,crewctl=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli).await
}
