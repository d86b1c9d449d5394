//! ClariQ CLI: rule-based chat assistant.
//!
//! Answers messages from fetched web pages, a local knowledge base, or
//! canned small talk, and serves the same router over HTTP.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
