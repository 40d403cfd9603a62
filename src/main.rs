//! Entry point for ringside, a terminal chat assistant that answers questions
//! about an event schedule and boxing records by calling lookup functions.
//!
//! This binary loads environment variables, sets up logging, parses CLI
//! arguments via [`cli`], and dispatches to the appropriate subcommand handler.

mod actions;
mod agent;
mod chat;
mod cli;
mod config;
mod constants;
mod conversation;
mod data;
mod format;
mod message;
mod output;
mod provider;
mod query;
mod stream;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Runs the ringside CLI.
///
/// Loads `.env` files (silently ignored if absent), installs a stderr
/// subscriber filtered by `RUST_LOG`, and dispatches the chosen subcommand
/// via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();

    let filter = if cli.verbose {
        "ringside=debug"
    } else {
        "ringside=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run(cli).await
}
