//! The storage collaborator seam.
//!
//! The engine never talks to a database directly: it hands [`HistoryRow`]s to
//! a [`HistoryStore`] and, for the incrementing version strategy, asks it for
//! the current maximum version of an object or to assign the next one while
//! inserting.

use async_trait::async_trait;
use serde_json::Value;

use crate::entry::History;
use crate::errors::HistoryError;
use crate::schema::is_zero_value;

/// One history entry, flattened to column values in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub table: &'static str,
    pub values: Vec<(&'static str, Value)>,
    /// Set when the store assigns the version while inserting. The version
    /// value in `values` is then provisional.
    pub next_version: Option<NextVersion>,
}

/// Version assignment done by the store: one past the highest integer
/// version already stored for `object_id`, read and written in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextVersion {
    pub object_id_column: &'static str,
    pub version_column: &'static str,
    pub object_id: String,
}

impl HistoryRow {
    /// Build the row for `history`. A zero primary key is omitted so storage
    /// can assign one.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Transform` if the record cannot be serialized.
    pub fn from_history(history: &dyn History) -> Result<Self, HistoryError> {
        let layout = history.history_layout();
        let fields = history.to_fields()?;

        let values = layout
            .columns()
            .iter()
            .filter_map(|column| {
                let value = fields.get(column.name).cloned().unwrap_or(Value::Null);
                if column.is_primary_key() && is_zero_value(&value) {
                    return None;
                }
                Some((column.name, value))
            })
            .collect();

        Ok(Self {
            table: layout.table(),
            values,
            next_version: None,
        })
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
    }

    /// Replace the value of `column`, if the row has it.
    pub fn set(&mut self, column: &str, value: Value) {
        if let Some(slot) = self.values.iter_mut().find(|(name, _)| *name == column) {
            slot.1 = value;
        }
    }
}

/// Lookup of the highest stored version for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxVersionQuery<'a> {
    pub table: &'a str,
    pub object_id_column: &'a str,
    pub version_column: &'a str,
    pub object_id: &'a str,
}

/// Writes history rows and answers version lookups.
///
/// Implementations must keep history writes independent of the entity
/// write's statement state.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert one row.
    ///
    /// When `row.next_version` is set, the version column must be computed
    /// from the stored rows atomically with the insert, so that concurrent
    /// writers of the same object never store the same version.
    async fn insert(&self, row: &HistoryRow) -> Result<(), HistoryError>;

    /// Highest integer version stored for the queried object, `None` when the
    /// object has no entries yet.
    async fn max_version(&self, query: &MaxVersionQuery<'_>) -> Result<Option<i64>, HistoryError>;
}
