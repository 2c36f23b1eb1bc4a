//! The recording decorator around entity writes.
//!
//! `HistoryService` owns a [`ChronDb`] and a [`Recorder`]. Every entity
//! mutation it performs runs the SQL first and then the matching recorder
//! hook, awaiting both before returning:
//!
//! 1. Execute the entity statement
//! 2. Inspect / assemble history through the recorder
//! 3. Insert each history row as its own statement
//!
//! No transaction spans the two. When recording fails, the entity write has
//! already happened and the error is returned to the caller. Batch entity
//! writes run in their own transaction, committed before recording starts.
//!
//! Repository methods live in [`crate::repos`] as `impl HistoryService`
//! blocks.

use std::path::Path;

use chron_config::ChronicleConfig;
use chron_core::{Model, Recorder};

use crate::ChronDb;
use crate::error::DatabaseError;

pub struct HistoryService {
    db: ChronDb,
    recorder: Recorder,
}

impl HistoryService {
    /// Open a local database and record with `recorder`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, recorder: Recorder) -> Result<Self, DatabaseError> {
        let db = ChronDb::open_local(db_path).await?;
        Ok(Self { db, recorder })
    }

    #[must_use]
    pub const fn from_db(db: ChronDb, recorder: Recorder) -> Self {
        Self { db, recorder }
    }

    /// Build the database and recorder from loaded configuration.
    ///
    /// Creates the database file's parent directory when needed.
    ///
    /// # Errors
    ///
    /// `Config` if `[database]` is not usable, `Other` if the directory
    /// cannot be created, or any open failure.
    pub async fn from_config(config: &ChronicleConfig) -> Result<Self, DatabaseError> {
        config.database.validate()?;

        if !config.database.is_in_memory() {
            if let Some(parent) = Path::new(&config.database.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
                }
            }
        }

        let recorder = Recorder::builder()
            .version_kind(config.recording.version_strategy)
            .enabled(config.recording.enabled)
            .build();

        tracing::debug!(
            path = %config.database.path,
            strategy = %config.recording.version_strategy,
            enabled = config.recording.enabled,
            "history service configured"
        );
        Self::new_local(&config.database.path, recorder).await
    }

    #[must_use]
    pub const fn db(&self) -> &ChronDb {
        &self.db
    }

    #[must_use]
    pub const fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Create the table for `M` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if the DDL fails.
    pub async fn register<M: Model>(&self) -> Result<(), DatabaseError> {
        self.db.ensure_table(M::layout()).await
    }
}
