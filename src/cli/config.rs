//! Agora configuration file handling
//!
//! Provides default configuration generation and loading for the ledger
//! service. Configuration files are TOML and live next to the journal by
//! default.
//!
//! Only deployment settings belong here (paths, event buffering, logging).
//! Governance rules are fixed by the ledger and can't be configured away.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default per-subscriber event buffer
const DEFAULT_CHANNEL_CAPACITY: usize = agora::events::stream::DEFAULT_CHANNEL_CAPACITY;

/// Journal file name used when no path is configured
const JOURNAL_FILE_NAME: &str = "ledger.journal";

/// Agora configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgoraConfig {
    /// Ledger storage configuration
    pub store: StoreConfig,

    /// Event feed configuration
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the append-only journal file
    pub journal_path: PathBuf,
}

/// Event feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber before a slow one starts skipping
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AgoraConfig {
    /// Create a new configuration with the given journal path
    #[cfg(test)]
    pub fn new(journal_path: PathBuf) -> Self {
        Self {
            store: StoreConfig { journal_path },
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: AgoraConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(journal_path: &Path) -> String {
        format!(
            r#"# Agora Governance Ledger Configuration
#
# Deployment settings only. The governance rules themselves (one vote per
# account, creator-only closing) are fixed and not configurable.

[store]
# Append-only journal holding every committed proposal, vote and close.
# Never edit or truncate this file by hand.
journal_path = {journal_path}

[events]
# Events buffered per subscriber before a slow subscriber starts skipping
channel_capacity = {capacity}

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides this)
level = "info"
"#,
            journal_path = toml::Value::String(journal_path.display().to_string()),
            capacity = DEFAULT_CHANNEL_CAPACITY,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        journal_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(journal_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }

    /// Load the config at `config_path`, creating a default one first if missing
    pub fn load_or_create(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !config_path.exists() {
            Self::create_default(config_path, &default_journal_path(config_path))?;
        }
        Self::load(config_path)
    }
}

/// Get the default journal path for a config file
///
/// The journal is stored adjacent to the config:
/// - Config: ~/.local/share/agora/config.toml
/// - Journal: ~/.local/share/agora/ledger.journal
pub fn default_journal_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or(config_path)
        .join(JOURNAL_FILE_NAME)
}

/// Get the default config path
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agora")
        .join("config.toml")
}
