//! Application configuration for ClariQ.
//!
//! User config lives at `~/.clariq/clariq.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClariqError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "clariq.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".clariq";

// ---------------------------------------------------------------------------
// Config structs (matching clariq.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Web page fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-category canned response overrides, keyed by category name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Vec<String>>,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite database file. A leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.clariq/clariq.db".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request. Some servers reject
    /// library default identifiers.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of characters of page text included in a reply.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Allow fetching loopback/private addresses.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            preview_chars: default_preview_chars(),
            allow_private_hosts: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}
fn default_preview_chars() -> usize {
    500
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the `/chat` endpoint binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".into()
}

impl StorageConfig {
    /// Resolve `db_path`, expanding a leading `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        expand_home(&self.db_path)
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| ClariqError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.clariq/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ClariqError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.clariq/clariq.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClariqError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ClariqError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClariqError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClariqError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClariqError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("Mozilla/5.0"));
        assert!(!toml_str.contains("[responses]"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.timeout_secs, 10);
        assert_eq!(parsed.fetch.preview_chars, 500);
        assert_eq!(parsed.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[fetch]
timeout_secs = 3

[responses]
greeting = ["Howdy!"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.fetch.user_agent, "Mozilla/5.0");
        assert!(!config.fetch.allow_private_hosts);
        assert_eq!(config.responses["greeting"], vec!["Howdy!".to_string()]);
        assert_eq!(config.storage.db_path, "~/.clariq/clariq.db");
    }

    #[test]
    fn expand_home_leaves_plain_paths_alone() {
        let path = expand_home("/tmp/clariq.db").expect("expand");
        assert_eq!(path, PathBuf::from("/tmp/clariq.db"));
    }

    #[test]
    fn expand_home_resolves_tilde() {
        let path = StorageConfig::default()
            .resolved_db_path()
            .expect("resolve db path");
        assert!(path.ends_with(".clariq/clariq.db"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let tmp = std::env::temp_dir().join(format!("clariq_bad_{}.toml", std::process::id()));
        std::fs::write(&tmp, "[fetch\ntimeout_secs = ").expect("write temp config");
        let result = load_config_from(&tmp);
        let _ = std::fs::remove_file(&tmp);
        assert!(result.unwrap_err().to_string().contains("failed to parse"));
    }
}
