//! Actions and strategy selectors.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The lifecycle event a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether this action starts a new object's history at the zero version.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::Create)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// VersionStrategyKind
// ---------------------------------------------------------------------------

/// Built-in version strategies, selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStrategyKind {
    /// Monotonic ULID tokens, lexicographically sortable.
    #[default]
    Ulid,
    /// `max(version) + 1` per object id, read from storage.
    Incrementing,
    /// Wall-clock nanoseconds. May collide under heavy writes.
    Timestamp,
}

impl VersionStrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ulid => "ulid",
            Self::Incrementing => "incrementing",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for VersionStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
