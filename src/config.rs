//! Configuration management for ScroogeCoin

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub handler: HandlerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct HandlerConfig {
    /// Run per-transaction checks across a rayon pool before the sequential
    /// conflict/commit pass. The accepted set is the same either way.
    #[serde(default)]
    pub parallel_precheck: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directive, e.g. `"info"` or `"scroogecoin=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

/// Loads the TOML config at `path`. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = match fs::read_to_string(path.as_ref()) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let config: Config = toml::from_str(&config_str)?;

    if config.logging.filter.trim().is_empty() {
        return Err(ChainError::ConfigError(
            "logging.filter must not be empty".to_string(),
        ));
    }
    if let Err(e) = EnvFilter::try_new(&config.logging.filter) {
        return Err(ChainError::ConfigError(format!(
            "logging.filter '{}' is invalid: {}",
            config.logging.filter, e
        )));
    }

    Ok(config)
}

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the config filter.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
