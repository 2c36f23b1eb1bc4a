//! Database error types for chron-db.

use chron_core::HistoryError;
use thiserror::Error;

/// Errors from entity writes, history reads, and table bootstrap.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A statement was rejected before reaching libSQL, such as a patch
    /// naming a column the layout does not declare.
    #[error("Query failed: {0}")]
    Query(String),

    /// `CREATE TABLE` / `CREATE INDEX` for a declared layout failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// An `INSERT ... RETURNING` produced no row.
    #[error("No result returned")]
    NoResult,

    /// Stored data does not match the declared layout.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The recording engine rejected or failed the history write.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// `[database]` settings are unusable.
    #[error(transparent)]
    Config(#[from] chron_config::ConfigError),

    /// Statement, constraint, or connection failure reported by libSQL.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Filesystem and other failures outside the database.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether the history engine refused to version the operation.
    #[must_use]
    pub const fn is_unsupported_operation(&self) -> bool {
        matches!(self, Self::History(e) if e.is_unsupported_operation())
    }
}

/// Storage failures reach the engine as persistence errors. Engine errors
/// travelling back through the store pass through unchanged.
impl From<DatabaseError> for HistoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::History(inner) => inner,
            other => Self::Persistence(anyhow::Error::new(other)),
        }
    }
}
