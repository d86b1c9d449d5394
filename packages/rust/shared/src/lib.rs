//! Shared types, error model, and configuration for ClariQ.
//!
//! This crate is the foundation depended on by all other ClariQ crates.
//! It provides:
//! - [`ClariqError`]: the unified error type
//! - Domain types ([`Intent`], [`Reply`], [`KnowledgeEntry`], [`ConversationLogEntry`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, ServerConfig, StorageConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from,
};
pub use error::{ClariqError, Result};
pub use types::{ConversationLogEntry, Intent, KnowledgeEntry, Reply};
