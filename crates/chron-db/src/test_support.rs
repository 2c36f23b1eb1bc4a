//! Fixtures for unit tests inside chron-db.

use std::sync::LazyLock;

use chron_core::{Column, ColumnKind, Entry, History, Layout, Model, Recordable};
use serde::{Deserialize, Serialize};

use crate::ChronDb;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub body: String,
    pub pinned: bool,
}

impl Model for Note {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("notes")
                .column(Column::primary_key("id"))
                .column(Column::new("body", ColumnKind::Text))
                .column(Column::new("pinned", ColumnKind::Boolean))
        });
        &LAYOUT
    }

    fn as_recordable(&self) -> Option<&dyn Recordable> {
        Some(self)
    }
}

impl Recordable for Note {
    fn create_history(&self) -> Box<dyn History> {
        Box::new(NoteHistory::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteHistory {
    pub id: i64,
    pub body: String,
    pub pinned: bool,
    #[serde(flatten)]
    pub entry: Entry,
}

impl Model for NoteHistory {
    fn layout() -> &'static Layout {
        static LAYOUT: LazyLock<Layout> = LazyLock::new(|| {
            Layout::new("note_histories")
                .column(Column::primary_key("id"))
                .column(Column::new("body", ColumnKind::Text))
                .column(Column::new("pinned", ColumnKind::Boolean))
                .embed(Entry::columns())
        });
        &LAYOUT
    }
}

chron_core::impl_entry_history!(NoteHistory, entry);

/// In-memory database with `notes` and `note_histories` created.
pub async fn test_db() -> ChronDb {
    let db = ChronDb::open_local(":memory:").await.unwrap();
    db.ensure_table(Note::layout()).await.unwrap();
    db.ensure_table(NoteHistory::layout()).await.unwrap();
    db
}
