//! Version tokens and the strategies that mint them.
//!
//! Creation entries always carry the strategy's zero version. Updates and
//! deletes get a token from [`VersionStrategy::next`]:
//!
//! - [`UlidVersion`]: monotonic ULIDs, lexicographically ordered, unique under
//!   concurrent use.
//! - [`IncrementingVersion`]: `max(version) + 1` per object. The store
//!   assigns the final value while inserting, so concurrent writers and
//!   repeated objects in one batch still get consecutive versions.
//! - [`TimestampVersion`]: wall-clock nanoseconds.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::History;
use crate::enums::{Action, VersionStrategyKind};
use crate::errors::HistoryError;
use crate::schema::{Fields, RoleMap};
use crate::store::{HistoryStore, MaxVersionQuery};

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// An ordered version token: integer for counters and timestamps, text for
/// ULIDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    Int(i64),
    Text(String),
}

impl Default for Version {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Version {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(n) => *n == 0,
            Self::Text(s) => s.is_empty(),
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy seam
// ---------------------------------------------------------------------------

/// Everything a strategy may consult when minting a version.
pub struct VersionContext<'a> {
    pub action: Action,
    pub object_id: &'a str,
    pub roles: &'a RoleMap,
    pub store: &'a dyn HistoryStore,
    /// State of the written entity.
    pub entity: &'a Fields,
    /// The history record being assembled, with action and object id set.
    pub history: &'a dyn History,
}

impl fmt::Debug for VersionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionContext")
            .field("action", &self.action)
            .field("object_id", &self.object_id)
            .field("table", &self.roles.table())
            .finish_non_exhaustive()
    }
}

/// Mints version tokens. Must be safe to call from many tasks at once.
#[async_trait]
pub trait VersionStrategy: Send + Sync {
    /// The version of a creation entry.
    fn zero(&self) -> Version;

    /// The version for the entry described by `ctx`.
    async fn next(&self, ctx: &VersionContext<'_>) -> Result<Version, HistoryError>;

    /// Whether non-initial versions are reassigned by the store at insert
    /// time (see [`crate::store::NextVersion`]).
    fn assigned_on_insert(&self) -> bool {
        false
    }
}

/// Instantiate a built-in strategy.
#[must_use]
pub fn strategy_for(kind: VersionStrategyKind) -> Arc<dyn VersionStrategy> {
    match kind {
        VersionStrategyKind::Ulid => Arc::new(UlidVersion::new()),
        VersionStrategyKind::Incrementing => Arc::new(IncrementingVersion),
        VersionStrategyKind::Timestamp => Arc::new(TimestampVersion::default()),
    }
}

// ---------------------------------------------------------------------------
// ULID
// ---------------------------------------------------------------------------

pub struct UlidVersion {
    generator: Mutex<ulid::Generator>,
}

impl UlidVersion {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: Mutex::new(ulid::Generator::new()),
        }
    }

    /// Mint the next token, strictly greater than every token this instance
    /// produced before.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::VersionGeneration` if the random component
    /// overflows within one millisecond or the generator lock is poisoned.
    pub fn mint(&self) -> Result<Version, HistoryError> {
        let mut generator = self
            .generator
            .lock()
            .map_err(|_| HistoryError::VersionGeneration("ulid generator lock poisoned".into()))?;
        let ulid = generator
            .generate()
            .map_err(|e| HistoryError::VersionGeneration(e.to_string()))?;
        Ok(Version::Text(ulid.to_string()))
    }
}

impl Default for UlidVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UlidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UlidVersion").finish_non_exhaustive()
    }
}

#[async_trait]
impl VersionStrategy for UlidVersion {
    fn zero(&self) -> Version {
        Version::Text(String::new())
    }

    async fn next(&self, ctx: &VersionContext<'_>) -> Result<Version, HistoryError> {
        if ctx.action.is_initial() {
            return Ok(self.zero());
        }
        self.mint()
    }
}

// ---------------------------------------------------------------------------
// Incrementing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementingVersion;

#[async_trait]
impl VersionStrategy for IncrementingVersion {
    fn zero(&self) -> Version {
        Version::Int(0)
    }

    async fn next(&self, ctx: &VersionContext<'_>) -> Result<Version, HistoryError> {
        if ctx.action.is_initial() {
            return Ok(self.zero());
        }

        let query = MaxVersionQuery {
            table: ctx.roles.table(),
            object_id_column: ctx.roles.object_id(),
            version_column: ctx.roles.version(),
            object_id: ctx.object_id,
        };
        let current = ctx.store.max_version(&query).await.map_err(|e| {
            HistoryError::VersionGeneration(format!(
                "reading max version of '{}' in {}: {e}",
                ctx.object_id, query.table
            ))
        })?;

        current
            .unwrap_or(0)
            .checked_add(1)
            .map(Version::Int)
            .ok_or_else(|| HistoryError::VersionGeneration("version counter overflow".into()))
    }

    fn assigned_on_insert(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

pub struct TimestampVersion {
    clock: fn() -> DateTime<Utc>,
}

impl TimestampVersion {
    #[must_use]
    pub const fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl Default for TimestampVersion {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

impl fmt::Debug for TimestampVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampVersion").finish_non_exhaustive()
    }
}

#[async_trait]
impl VersionStrategy for TimestampVersion {
    fn zero(&self) -> Version {
        Version::Int(0)
    }

    async fn next(&self, ctx: &VersionContext<'_>) -> Result<Version, HistoryError> {
        if ctx.action.is_initial() {
            return Ok(self.zero());
        }
        (self.clock)()
            .timestamp_nanos_opt()
            .map(Version::Int)
            .ok_or_else(|| HistoryError::VersionGeneration("clock outside nanosecond range".into()))
    }
}
