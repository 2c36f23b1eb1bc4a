//! `[database]` section: where history and entity tables live.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_path() -> String {
    ".chronicle/history.db".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Local libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.path.trim().is_empty()
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// # Errors
    ///
    /// `NotConfigured` when the path is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ConfigError::NotConfigured {
                section: "database".into(),
            })
        }
    }
}
