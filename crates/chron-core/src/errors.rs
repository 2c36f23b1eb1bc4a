//! Error taxonomy for the recording engine.
//!
//! Every variant aborts the current recording attempt and is returned to the
//! code that triggered the entity write. Nothing is retried inside the engine.

use thiserror::Error;

/// Errors raised while deciding, assembling, or persisting a history entry.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A history type is missing a required semantic role (object id, version).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation cannot be versioned, e.g. an entity without a usable
    /// identity or a bulk update with no per-row identity.
    #[error("history is not supported for this operation: {0}")]
    UnsupportedOperation(String),

    /// The entity could not be copied into its history counterpart.
    #[error("Transform error: {0}")]
    Transform(String),

    /// A version token could not be minted.
    #[error("error generating history version: {0}")]
    VersionGeneration(String),

    /// The storage collaborator failed to write or read history rows.
    #[error("Persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl HistoryError {
    /// Whether this is the "cannot version this operation" rejection.
    #[must_use]
    pub const fn is_unsupported_operation(&self) -> bool {
        matches!(self, Self::UnsupportedOperation(_))
    }
}
