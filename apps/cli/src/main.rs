//! driveup command line entry point.

mod app;
mod config;

use std::process::ExitCode;

use clap::Parser;
use driveup_relay::RelayConfig;
use tracing_subscriber::EnvFilter;

use crate::config::Args;

fn main() -> anyhow::Result<ExitCode> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the outcome JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.relay_config(RelayConfig::from_env());
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), ?config, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(args, config))
}
