//! `[log]` section and subscriber installation.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::ConfigError;

/// Env var holding a filter directive that overrides `[log] level`.
pub const LOG_ENV: &str = "CHRONICLE_LOG";

fn default_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Default filter directive, e.g. `warn` or `chron_db=debug`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl LogConfig {
    /// Filter from `CHRONICLE_LOG` if set and valid, else from `level`.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if `level` is not a valid directive.
    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| ConfigError::InvalidValue {
            field: "log.level".into(),
            reason: e.to_string(),
        })
    }
}

/// Install the global fmt subscriber.
///
/// # Errors
///
/// `InvalidValue` for a bad level, `Tracing` if a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = config.filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ConfigError::Tracing(error.to_string()))
}
