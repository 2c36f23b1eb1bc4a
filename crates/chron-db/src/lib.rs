//! # chron-db
//!
//! libSQL storage for Chronicle.
//!
//! [`ChronDb`] is the storage collaborator the recording engine writes
//! history rows through (it implements [`chron_core::HistoryStore`]).
//! [`service::HistoryService`] decorates entity writes: every create,
//! update, and delete it performs is followed by the matching recorder hook
//! on the same connection.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
mod store;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use error::DatabaseError;
use libsql::params::IntoParams;
use libsql::{Builder, TransactionBehavior};

pub use service::HistoryService;

/// How long a statement waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle on a libSQL database and its single connection.
pub struct ChronDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl ChronDb {
    /// Open a local database file, or `":memory:"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::debug!(path, "opened history database");
        Ok(Self { db, conn })
    }

    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Run one statement, returning the number of changed rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the statement fails.
    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> Result<u64, DatabaseError> {
        Ok(self.conn.execute(sql, params).await?)
    }

    /// Take the write lock now. Statements on this connection belong to the
    /// transaction until it is committed or rolled back.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the lock cannot be taken in time.
    pub async fn begin_immediate(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the query fails.
    pub async fn query(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<libsql::Rows, DatabaseError> {
        Ok(self.conn.query(sql, params).await?)
    }
}
