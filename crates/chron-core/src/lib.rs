//! # chron-core
//!
//! Audit history recording engine.
//!
//! After an entity write succeeds, the host data layer hands the written
//! entities to a [`Recorder`]. For every entity that opts in through
//! [`Recordable`], the recorder snapshots the entity into its history type,
//! stamps it with an action, a version, the object id, and (when the history
//! type supports it) a timestamp, the acting user, and the change source, and
//! writes it through a [`HistoryStore`].
//!
//! Per-operation metadata travels in a [`RecordingContext`].

pub mod context;
pub mod entry;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod recorder;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod version;

#[cfg(test)]
mod test_support;

pub use context::RecordingContext;
pub use entry::{Blameable, Capabilities, Entry, History, Recordable, Sourceable, Timestampable};
pub use enums::{Action, VersionStrategyKind};
pub use errors::HistoryError;
pub use identity::{Source, User};
pub use recorder::{Outcome, Recorder, RecorderBuilder, SkipReason, Target};
pub use schema::{Column, ColumnKind, Fields, Identity, Layout, Model, Role, RoleMap};
pub use snapshot::CopyStrategy;
pub use store::{HistoryRow, HistoryStore, MaxVersionQuery, NextVersion};
pub use version::{
    IncrementingVersion, TimestampVersion, UlidVersion, Version, VersionContext, VersionStrategy,
};
