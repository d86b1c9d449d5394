//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use clariq_core::{ChatRouter, open_router};
use clariq_shared::{AppConfig, init_config, load_config};
use clariq_storage::Storage;

use crate::server;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ClariQ: a rule-based assistant for links, facts and small talk.
#[derive(Parser)]
#[command(
    name = "clariq",
    version,
    about = "Answer messages from web pages, a local knowledge base, or canned small talk.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Database path (overrides `storage.db_path`).
    #[arg(long, global = true, env = "CLARIQ_DB")]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a single message.
    Ask {
        /// The message to answer.
        message: String,

        /// Print `{"response", "intent"}` as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat on stdin (`exit` or `quit` to leave).
    Chat,

    /// Serve the HTTP chat API.
    Serve {
        /// Listen address (defaults to `server.bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Load the starter knowledge set into an empty database.
    Seed,

    /// Manage knowledge entries.
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeAction,
    },

    /// Show recent conversation turns.
    Logs {
        /// Number of turns to show, newest first.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Knowledge subcommands.
#[derive(Subcommand)]
pub(crate) enum KnowledgeAction {
    /// Add a question/answer pair.
    Add { question: String, answer: String },
    /// List all entries in insertion order.
    List,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "clariq=info",
        1 => "clariq=debug",
        _ => "clariq=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `ask --json` output stays clean.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.db.as_deref())?;

    match cli.command {
        Command::Ask { message, json } => cmd_ask(&config, &message, json).await,
        Command::Chat => cmd_chat(&config).await,
        Command::Serve { bind } => cmd_serve(&config, bind.as_deref()).await,
        Command::Seed => cmd_seed(&config).await,
        Command::Knowledge { action } => match action {
            KnowledgeAction::Add { question, answer } => {
                cmd_knowledge_add(&config, &question, &answer).await
            }
            KnowledgeAction::List => cmd_knowledge_list(&config).await,
        },
        Command::Logs { limit } => cmd_logs(&config, limit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

/// Load the config file and apply flag overrides.
fn resolve_config(db: Option<&Path>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(db) = db {
        config.storage.db_path = db.to_string_lossy().into_owned();
    }
    Ok(config)
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = config.storage.resolved_db_path()?;
    Ok(Storage::open(&path).await?)
}

/// Read-only handle for inspection commands.
async fn open_storage_readonly(config: &AppConfig) -> Result<Storage> {
    let path = config.storage.resolved_db_path()?;
    Ok(Storage::open_readonly(&path).await?)
}

// ---------------------------------------------------------------------------
// Chat commands
// ---------------------------------------------------------------------------

async fn cmd_ask(config: &AppConfig, message: &str, json: bool) -> Result<()> {
    let router = open_router(config).await?;

    let spinner = spinner("Thinking...")?;
    let reply = router.reply(message).await;
    spinner.finish_and_clear();

    if json {
        let out = serde_json::json!({
            "response": reply.text,
            "intent": reply.intent,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", reply.text);
    }
    Ok(())
}

async fn cmd_chat(config: &AppConfig) -> Result<()> {
    let router: ChatRouter = open_router(config).await?;
    info!("starting interactive chat");

    println!("ClariQ: type 'exit' or 'quit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let reply = router.reply(message).await;
        println!("ClariQ: {}", reply.text);
    }

    Ok(())
}

async fn cmd_serve(config: &AppConfig, bind: Option<&str>) -> Result<()> {
    let router = open_router(config).await?;
    let addr = bind.unwrap_or(&config.server.bind);
    server::serve(router, addr).await
}

/// Spinner on stderr matching the rest of the CLI.
fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

// ---------------------------------------------------------------------------
// Knowledge and log commands
// ---------------------------------------------------------------------------

async fn cmd_seed(config: &AppConfig) -> Result<()> {
    let storage = open_storage(config).await?;
    let inserted = storage.seed_default_knowledge().await?;
    if inserted == 0 {
        println!("Knowledge base already has entries; nothing seeded.");
    } else {
        println!("Seeded {inserted} knowledge entries.");
    }
    Ok(())
}

async fn cmd_knowledge_add(config: &AppConfig, question: &str, answer: &str) -> Result<()> {
    if question.trim().is_empty() || answer.trim().is_empty() {
        return Err(eyre!("question and answer must not be empty"));
    }
    let storage = open_storage(config).await?;
    let id = storage.insert_knowledge(question, answer).await?;
    info!(id, "knowledge entry added");
    println!("Added entry #{id}.");
    Ok(())
}

async fn cmd_knowledge_list(config: &AppConfig) -> Result<()> {
    let storage = open_storage_readonly(config).await?;
    let entries = storage.list_knowledge().await?;

    if entries.is_empty() {
        println!("No knowledge entries. Run `clariq seed` or `clariq knowledge add`.");
        return Ok(());
    }

    for entry in &entries {
        println!("#{:<4} Q: {}", entry.id, entry.question);
        println!("      A: {}", entry.answer);
    }
    println!();
    println!("  {} entries", entries.len());
    Ok(())
}

async fn cmd_logs(config: &AppConfig, limit: u32) -> Result<()> {
    let storage = open_storage_readonly(config).await?;
    let logs = storage.recent_conversation_logs(limit).await?;

    if logs.is_empty() {
        println!("No conversation turns logged yet.");
        return Ok(());
    }

    for entry in &logs {
        println!(
            "{} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.intent,
            entry.user_input
        );
        println!("    -> {}", entry.bot_response);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
