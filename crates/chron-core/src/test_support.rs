//! Shared fixtures for unit tests: sample models and an in-memory store.

use std::sync::{LazyLock, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, History, Recordable};
use crate::enums::Action;
use crate::errors::HistoryError;
use crate::schema::{Column, ColumnKind, Fields, Layout, Model, Role, from_fields, to_fields};
use crate::store::{HistoryRow, HistoryStore, MaxVersionQuery};
use crate::version::Version;

// ---------------------------------------------------------------------------
// Person / PersonHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub address_id: Option<u64>,
}

impl Model for Person {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("people")
                .column(Column::primary_key("id"))
                .column(Column::new("first_name", ColumnKind::Text))
                .column(Column::new("last_name", ColumnKind::Text))
                .column(Column::new("address_id", ColumnKind::Integer))
        });
        &LAYOUT
    }

    fn as_recordable(&self) -> Option<&dyn Recordable> {
        Some(self)
    }
}

impl Recordable for Person {
    fn create_history(&self) -> Box<dyn History> {
        Box::new(PersonHistory::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonHistory {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub address_id: u64,
    #[serde(flatten)]
    pub entry: Entry,
}

impl Model for PersonHistory {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("person_histories")
                .column(Column::primary_key("id"))
                .column(Column::new("first_name", ColumnKind::Text))
                .column(Column::new("last_name", ColumnKind::Text))
                .column(Column::new("address_id", ColumnKind::Integer))
                .embed(Entry::columns())
        });
        &LAYOUT
    }
}

crate::impl_entry_history!(PersonHistory, entry);

// ---------------------------------------------------------------------------
// Address (not tracked)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: u64,
    pub street: String,
}

impl Model for Address {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("addresses")
                .column(Column::primary_key("id"))
                .column(Column::new("street", ColumnKind::Text))
        });
        &LAYOUT
    }
}

// ---------------------------------------------------------------------------
// PlainOwner / PlainHistory: no optional capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainOwner {
    pub id: u64,
    pub label: String,
}

impl Model for PlainOwner {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("plain_owners")
                .column(Column::primary_key("id"))
                .column(Column::new("label", ColumnKind::Text))
        });
        &LAYOUT
    }

    fn as_recordable(&self) -> Option<&dyn Recordable> {
        Some(self)
    }
}

impl Recordable for PlainOwner {
    fn create_history(&self) -> Box<dyn History> {
        Box::new(PlainHistory::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainHistory {
    pub id: u64,
    pub label: String,
    pub version: Version,
    pub object_id: String,
    pub action: Option<Action>,
}

static PLAIN_HISTORY_LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
    Layout::new("plain_histories")
        .column(Column::primary_key("id"))
        .column(Column::new("label", ColumnKind::Text))
        .column(Column::new("version", ColumnKind::Any).with_role(Role::Version))
        .column(Column::new("object_id", ColumnKind::Text).with_role(Role::ObjectId))
        .column(Column::new("action", ColumnKind::Text).with_role(Role::Action))
});

impl History for PlainHistory {
    fn history_layout(&self) -> &'static Layout {
        &PLAIN_HISTORY_LAYOUT
    }

    fn set_history_version(&mut self, version: Version) {
        self.version = version;
    }

    fn set_history_object_id(&mut self, object_id: String) {
        self.object_id = object_id;
    }

    fn set_history_action(&mut self, action: Action) {
        self.action = Some(action);
    }

    fn to_fields(&self) -> Result<Fields, HistoryError> {
        to_fields(self)
    }

    fn load_fields(&mut self, fields: Fields) -> Result<(), HistoryError> {
        *self = from_fields(fields)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BrokenHistoryOwner: history layout without a version column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrokenHistoryOwner {
    pub id: u64,
}

impl Model for BrokenHistoryOwner {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> =
            LazyLock::new(|| Layout::new("broken_owners").column(Column::primary_key("id")));
        &LAYOUT
    }

    fn as_recordable(&self) -> Option<&dyn Recordable> {
        Some(self)
    }
}

impl Recordable for BrokenHistoryOwner {
    fn create_history(&self) -> Box<dyn History> {
        Box::new(BrokenHistory::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokenHistory {
    pub id: u64,
    pub object_id: String,
}

static BROKEN_HISTORY_LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
    Layout::new("broken_histories")
        .column(Column::primary_key("id"))
        .column(Column::new("object_id", ColumnKind::Text).with_role(Role::ObjectId))
});

impl History for BrokenHistory {
    fn history_layout(&self) -> &'static Layout {
        &BROKEN_HISTORY_LAYOUT
    }

    fn set_history_version(&mut self, _version: Version) {}

    fn set_history_object_id(&mut self, object_id: String) {
        self.object_id = object_id;
    }

    fn set_history_action(&mut self, _action: Action) {}

    fn to_fields(&self) -> Result<Fields, HistoryError> {
        to_fields(self)
    }

    fn load_fields(&mut self, fields: Fields) -> Result<(), HistoryError> {
        *self = from_fields(fields)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps rows in a vector. Optionally fails after a number of inserts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<HistoryRow>>,
    fail_after: Option<usize>,
}

impl MemoryStore {
    /// Every call fails.
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    pub fn failing_after(inserts: usize) -> Self {
        Self {
            rows: Mutex::default(),
            fail_after: Some(inserts),
        }
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed_version(&self, table: &'static str, object_id: &str, version: i64) {
        self.rows.lock().unwrap().push(HistoryRow {
            table,
            values: vec![
                ("object_id", object_id.into()),
                ("version", version.into()),
            ],
            next_version: None,
        });
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert(&self, row: &HistoryRow) -> Result<(), HistoryError> {
        let mut rows = self.rows.lock().unwrap();
        if self.fail_after.is_some_and(|limit| rows.len() >= limit) {
            return Err(HistoryError::Persistence(anyhow::anyhow!("insert refused")));
        }

        let mut row = row.clone();
        if let Some(next) = row.next_version.take() {
            let current = rows
                .iter()
                .filter(|r| r.table == row.table)
                .filter(|r| r.get(next.object_id_column).and_then(|v| v.as_str()) == Some(next.object_id.as_str()))
                .filter_map(|r| r.get(next.version_column).and_then(serde_json::Value::as_i64))
                .max()
                .unwrap_or(0);
            row.set(next.version_column, (current + 1).into());
        }
        rows.push(row);
        Ok(())
    }

    async fn max_version(&self, query: &MaxVersionQuery<'_>) -> Result<Option<i64>, HistoryError> {
        if self.fail_after == Some(0) {
            return Err(HistoryError::Persistence(anyhow::anyhow!("lookup refused")));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.table == query.table)
            .filter(|r| r.get(query.object_id_column).and_then(|v| v.as_str()) == Some(query.object_id))
            .filter_map(|r| r.get(query.version_column).and_then(serde_json::Value::as_i64))
            .max())
    }
}
