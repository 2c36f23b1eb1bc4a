//! # chron-config
//!
//! Layered configuration for Chronicle, built on figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`CHRONICLE_*` prefix, `__` between section and key)
//! 2. Project-level `.chronicle/config.toml`
//! 3. User-level `~/.config/chronicle/config.toml`
//! 4. Built-in defaults
//!
//! `CHRONICLE_RECORDING__VERSION_STRATEGY=incrementing` sets
//! `recording.version_strategy`.
//!
//! ```no_run
//! use chron_config::{ChronicleConfig, init_tracing};
//!
//! let config = ChronicleConfig::load_with_dotenv().expect("config");
//! init_tracing(&config.log).expect("tracing");
//! ```

mod database;
mod error;
mod log;
mod recording;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use log::{LOG_ENV, LogConfig, init_tracing};
pub use recording::RecordingConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CHRONICLE_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChronicleConfig {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl ChronicleConfig {
    /// Load from TOML files and the environment. `.env` is not read; see
    /// [`ChronicleConfig::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// `Figment` when a source fails to parse or a value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load `.env` from the workspace root (or the current dir), then
    /// [`ChronicleConfig::load`].
    ///
    /// # Errors
    ///
    /// Same as [`ChronicleConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// The provider chain, exposed so tests can layer extra providers.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".chronicle/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` at most three levels. Missing files
    /// are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
