//! ClariQ TUI: interactive terminal chat with knowledge and history views.
//!
//! Built with `ratatui` + `crossterm` over the same router as the CLI.
//! Logs go to `~/.clariq/clariq-tui.log` since the terminal is taken.

mod app;
mod screens;
mod widgets;

use std::fs::File;
use std::sync::Mutex;

use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use clariq_core::open_router;
use clariq_shared::{AppConfig, config_dir, load_config};

const LOG_FILE: &str = "clariq-tui.log";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let config = resolve_config()?;
    let router = open_router(&config).await?;
    app::run(router).await
}

/// `CLARIQ_DB` overrides `storage.db_path`, as with the CLI's `--db`.
fn resolve_config() -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Ok(db) = std::env::var("CLARIQ_DB") {
        config.storage.db_path = db;
    }
    Ok(config)
}

fn init_tracing() -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = File::create(dir.join(LOG_FILE))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clariq=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
