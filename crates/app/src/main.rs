//! Harmatch command-line client
//!
//! Drives the client state engine from a terminal. State lives in the
//! snapshot file between invocations, so consecutive commands behave
//! like one long session.

mod cli;
mod render;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::Cli::parse();
    cli::run(args).await
}
