// src/config.rs
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Command journal; without it the marketplace lives in memory only.
    pub data_file: Option<PathBuf>,
    /// Where uploaded media is written. Defaults to a directory next to the journal.
    pub media_dir: Option<PathBuf>,
    pub media_base_url: String,
    pub sweep_interval_secs: u64,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_file: None,
            media_dir: None,
            media_base_url: "http://localhost:8080/media".to_string(),
            sweep_interval_secs: 60,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, expected, value }),
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", "port number", defaults.port)?,
            data_file: lookup("DATA_FILE").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            media_dir: lookup("MEDIA_DIR").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            media_base_url: lookup("MEDIA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.media_base_url),
            sweep_interval_secs: parsed(
                &lookup,
                "OFFER_SWEEP_INTERVAL_SECS",
                "number of seconds",
                defaults.sweep_interval_secs,
            )?,
            default_page_size: parsed(&lookup, "DEFAULT_PAGE_SIZE", "page size", defaults.default_page_size)?,
            max_page_size: parsed(&lookup, "MAX_PAGE_SIZE", "page size", defaults.max_page_size)?,
        };
        if config.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "OFFER_SWEEP_INTERVAL_SECS",
                expected: "number of seconds",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    /// Directory for persistent media, if any. A journal without one would
    /// replay auctions whose photos no longer exist.
    pub fn media_root(&self) -> Option<PathBuf> {
        self.media_dir
            .clone()
            .or_else(|| self.data_file.as_ref().map(|path| path.with_extension("media")))
    }
}
