//! Models shared by the chron-db integration suites.

#![allow(dead_code)]

use std::sync::LazyLock;

use chron_core::{
    Column, ColumnKind, Entry, History, Layout, Model, Recordable, Recorder, VersionStrategyKind,
};
use chron_db::HistoryService;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub address_id: Option<u64>,
}

impl Person {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }
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

chron_core::impl_entry_history!(PersonHistory, entry);

/// Stored but not tracked.
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

pub async fn register_all(svc: &HistoryService) {
    svc.register::<Person>().await.unwrap();
    svc.register::<PersonHistory>().await.unwrap();
    svc.register::<Address>().await.unwrap();
}

pub async fn service(kind: VersionStrategyKind) -> HistoryService {
    let recorder = Recorder::builder().version_kind(kind).build();
    service_with(recorder).await
}

pub async fn service_with(recorder: Recorder) -> HistoryService {
    let svc = HistoryService::new_local(":memory:", recorder).await.unwrap();
    register_all(&svc).await;
    svc
}

pub async fn entries_for(svc: &HistoryService, person: &Person) -> Vec<PersonHistory> {
    svc.history_of(&person.id.to_string()).await.unwrap()
}
