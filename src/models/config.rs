//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the data store base URL.
pub const ENV_STORE_URL: &str = "STORE_URL";
/// Environment variable holding the data store service credential.
pub const ENV_STORE_SERVICE_KEY: &str = "STORE_SERVICE_KEY";
/// Environment variable holding the optional upstream auth cookie.
pub const ENV_PUZZLE_AUTH_COOKIE: &str = "PUZZLE_AUTH_COOKIE";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data store connection and table names
    #[serde(default)]
    pub store: StoreConfig,

    /// Upstream puzzle source
    #[serde(default)]
    pub source: SourceConfig,

    /// Range ingestion behavior
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay secrets and endpoints from an environment lookup.
    ///
    /// Non-empty values win over whatever the file provided.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_STORE_URL) {
            self.store.url = url;
        }
        if let Some(key) = non_empty(ENV_STORE_SERVICE_KEY) {
            self.store.service_key = key;
        }
        if let Some(cookie) = non_empty(ENV_PUZZLE_AUTH_COOKIE) {
            self.source.auth_cookie = Some(cookie);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.validate_store()?;
        self.validate_source()
    }

    /// Validate the REST store connection settings and credentials.
    pub fn validate_store(&self) -> Result<()> {
        if self.store.url.trim().is_empty() {
            return Err(AppError::config(format!(
                "store.url is empty (set {ENV_STORE_URL})"
            )));
        }
        if self.store.service_key.trim().is_empty() {
            return Err(AppError::config(format!(
                "store.service_key is empty (set {ENV_STORE_SERVICE_KEY})"
            )));
        }
        url::Url::parse(&self.store.url)?;
        if self.store.staging_table.trim().is_empty() {
            return Err(AppError::validation("store.staging_table is empty"));
        }
        if self.store.failure_table.trim().is_empty() {
            return Err(AppError::validation("store.failure_table is empty"));
        }
        if self.store.promote_rpc.trim().is_empty() {
            return Err(AppError::validation("store.promote_rpc is empty"));
        }
        if self.store.timeout_secs == 0 {
            return Err(AppError::validation("store.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Validate the upstream source settings.
    pub fn validate_source(&self) -> Result<()> {
        if self.source.slug.trim().is_empty() {
            return Err(AppError::validation("source.slug is empty"));
        }
        if self.source.endpoint.trim().is_empty() {
            return Err(AppError::validation("source.endpoint is empty"));
        }
        url::Url::parse(&self.source.endpoint)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Data store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the REST data store
    #[serde(default)]
    pub url: String,

    /// Service credential; normally supplied through the environment
    #[serde(default, skip_serializing)]
    pub service_key: String,

    #[serde(default = "defaults::staging_table")]
    pub staging_table: String,

    #[serde(default = "defaults::failure_table")]
    pub failure_table: String,

    /// Stored procedure merging staged rows into the permanent store
    #[serde(default = "defaults::promote_rpc")]
    pub promote_rpc: String,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            staging_table: defaults::staging_table(),
            failure_table: defaults::failure_table(),
            promote_rpc: defaults::promote_rpc(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Upstream puzzle source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Slug of the puzzle source rows are filed under
    #[serde(default = "defaults::source_slug")]
    pub slug: String,

    /// Base URL; the payload for a date lives at `{endpoint}/{date}.json`
    #[serde(default)]
    pub endpoint: String,

    /// Public link template for `source_url`.
    ///
    /// Supported placeholders: `{date}`, `{id}`. Empty means "use the fetch URL".
    #[serde(default)]
    pub puzzle_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Cookie header value; normally supplied through the environment
    #[serde(default, skip_serializing)]
    pub auth_cookie: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            slug: defaults::source_slug(),
            endpoint: String::new(),
            puzzle_url: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            auth_cookie: None,
        }
    }
}

/// Range ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Delay between dates in milliseconds
    #[serde(default = "defaults::delay_ms")]
    pub delay_ms: u64,

    /// Leave staged rows in place after promotion
    #[serde(default)]
    pub keep_staging: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delay_ms: defaults::delay_ms(),
            keep_staging: false,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Store defaults
    pub fn staging_table() -> String {
        "clue_occurrences_staging".into()
    }
    pub fn failure_table() -> String {
        "ingest_failures".into()
    }
    pub fn promote_rpc() -> String {
        "promote_staged_clues".into()
    }

    // Source defaults
    pub fn source_slug() -> String {
        "daily".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; xword-ingest/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Ingest defaults
    pub fn delay_ms() -> u64 {
        750
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.endpoint = "https://puzzles.example/api/daily".to_string();
        config.apply_env(|key| match key {
            ENV_STORE_URL => Some("https://store.example".to_string()),
            ENV_STORE_SERVICE_KEY => Some("service-key".to_string()),
            _ => None,
        });
        config
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let mut config = Config::default();
        config.source.endpoint = "https://puzzles.example/api/daily".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(ENV_STORE_URL)));

        config.store.url = "https://store.example".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(ENV_STORE_SERVICE_KEY)));
    }

    #[test]
    fn validate_rejects_empty_endpoint() {
        let mut config = valid_config();
        config.source.endpoint = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_source_ignores_store_credentials() {
        let mut config = Config::default();
        config.source.endpoint = "https://puzzles.example/api/daily".to_string();
        assert!(config.validate_source().is_ok());
        assert!(config.validate_store().is_err());
    }

    #[test]
    fn apply_env_ignores_blank_values() {
        let mut config = valid_config();
        config.apply_env(|key| match key {
            ENV_STORE_URL => Some("   ".to_string()),
            ENV_PUZZLE_AUTH_COOKIE => Some("session=abc".to_string()),
            _ => None,
        });
        assert_eq!(config.store.url, "https://store.example");
        assert_eq!(config.source.auth_cookie.as_deref(), Some("session=abc"));
    }

    #[test]
    fn defaults_from_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [source]
            slug = "weekend"
            endpoint = "https://puzzles.example/api/weekend"
            "#,
        )
        .unwrap();
        assert_eq!(config.source.slug, "weekend");
        assert_eq!(config.ingest.delay_ms, 750);
        assert!(!config.ingest.keep_staging);
        assert_eq!(config.store.promote_rpc, "promote_staged_clues");
    }
}
