//! Configuration
//!
//! Options shared by every `pharmarep` subcommand. Each option can also come
//! from the environment or a `.env` file.

use std::path::PathBuf;

use clap::Args;
use rusty_money::{Findable, iso::Currency};
use thiserror::Error;

use crate::store::FileStorage;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The currency code is not an ISO 4217 code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding `collections.json`, `orders.json` and `missingItems.json`
    #[arg(long, env = "PHARMAREP_DATA_DIR", default_value = "./data", global = true)]
    pub data_dir: PathBuf,

    /// ISO 4217 code used when printing amounts
    #[arg(long, env = "PHARMAREP_CURRENCY", default_value = "SAR", global = true)]
    pub currency: String,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads `.env` into the process environment if present.
    pub fn load_dotenv() {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();
    }

    /// Storage rooted at the data directory.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir)
    }

    /// Resolved display currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not recognised.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        let code = self.currency.trim().to_uppercase();

        Currency::find(&code).ok_or(ConfigError::UnknownCurrency(code))
    }
}
