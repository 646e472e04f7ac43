//! Configuration types.

use std::path::PathBuf;

use crate::dialog::Locale;
use crate::error::ConfigError;

/// Database path that selects the in-memory store.
pub const MEMORY_DB: &str = ":memory:";

/// Where conversation and profile state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    LibSql(PathBuf),
}

/// Bot configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub storage: StorageConfig,
    /// Interface to bind the HTTP server on.
    pub host: String,
    pub port: u16,
    pub locale: Locale,
    /// Directory served for paths outside the API, e.g. a landing page.
    pub static_dir: PathBuf,
    /// Also read turns from stdin.
    pub cli: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::LibSql(PathBuf::from("./data/details-bot.db")),
            host: "0.0.0.0".to_string(),
            port: 3978,
            locale: Locale::English,
            static_dir: PathBuf::from("./wwwroot"),
            cli: false,
        }
    }
}

impl BotConfig {
    /// Load from `DETAILS_BOT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("DETAILS_BOT_DB_PATH") {
            config.storage = if path == MEMORY_DB {
                StorageConfig::Memory
            } else {
                StorageConfig::LibSql(PathBuf::from(path))
            };
        }

        if let Some(host) = lookup("DETAILS_BOT_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("DETAILS_BOT_PORT") {
            config.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "DETAILS_BOT_PORT".to_string(),
                message: format!("{port:?}: {e}"),
            })?;
        }

        if let Some(locale) = lookup("DETAILS_BOT_LOCALE") {
            config.locale = locale
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "DETAILS_BOT_LOCALE".to_string(),
                    message,
                })?;
        }

        if let Some(dir) = lookup("DETAILS_BOT_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        config.cli = lookup("DETAILS_BOT_CLI")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
