// src/config.rs

//! Configuration loading utilities.
//!
//! Combines the TOML file with secrets from the environment and validates
//! the result before any component is constructed.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Load the config file (defaults when it does not exist), overlay the
/// environment through `lookup`, and validate.
///
/// Store credentials are only required when `require_store` is set; a
/// filesystem-backed run needs the source section alone.
pub fn load_runtime_config<F>(path: &Path, lookup: F, require_store: bool) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!("Config file {} not found. Using defaults.", path.display());
        Config::default()
    };
    config.apply_env(lookup);

    if require_store {
        config.validate()?;
    } else {
        config.validate_source()?;
    }
    Ok(config)
}

/// Environment lookup backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
