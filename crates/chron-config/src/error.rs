use thiserror::Error;

/// Errors raised while loading settings or installing the log subscriber.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// The `[database]` section lacks the fields needed to open storage.
    #[error("Configuration section '{section}' is not configured (missing required fields)")]
    NotConfigured { section: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A global tracing subscriber is already installed, or the filter
    /// directive did not parse.
    #[error("failed to initialize tracing subscriber: {0}")]
    Tracing(String),
}
