//! The recording pipeline: inspect, assemble, persist.
//!
//! The host data layer calls [`Recorder::after_create`],
//! [`Recorder::after_update`], or [`Recorder::after_delete`] once an entity
//! write has succeeded. Every element of the write is inspected first, so a
//! batch containing one unrecordable element fails before any history row is
//! written.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::context::RecordingContext;
use crate::entry::Recordable;
use crate::enums::{Action, VersionStrategyKind};
use crate::errors::HistoryError;
use crate::schema::{Identity, Model, RoleMap, resolve_identity, to_fields};
use crate::snapshot::{CopyStrategy, snapshot_fields};
use crate::store::{HistoryRow, HistoryStore, NextVersion};
use crate::version::{UlidVersion, VersionContext, VersionStrategy, strategy_for};

/// Source of `created_at` values.
pub type Clock = fn() -> DateTime<Utc>;

/// The entity payload of a completed write.
#[derive(Debug)]
pub enum Target<'a, E> {
    /// The write did not expose a typed entity (raw SQL).
    Unknown,
    One(&'a E),
    Many(&'a [E]),
}

impl<E> Clone for Target<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Target<'_, E> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownSchema,
    Disabled,
    NotRecordable,
}

/// Verdict for one element.
pub enum Inspection<'a> {
    Skipped(SkipReason),
    Eligible {
        recordable: &'a dyn Recordable,
        identity: Identity,
    },
}

impl fmt::Debug for Inspection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => f.debug_tuple("Skipped").field(reason).finish(),
            Self::Eligible { identity, .. } => f
                .debug_struct("Eligible")
                .field("identity", identity)
                .finish_non_exhaustive(),
        }
    }
}

/// Result of one recording pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Persisted(usize),
}

impl Outcome {
    #[must_use]
    pub const fn persisted(self) -> usize {
        match self {
            Self::Skipped(_) => 0,
            Self::Persisted(n) => n,
        }
    }
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

pub struct Recorder {
    version: Arc<dyn VersionStrategy>,
    copy: CopyStrategy,
    clock: Clock,
    enabled: bool,
}

impl Recorder {
    /// ULID versions, structural copy, wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> RecorderBuilder {
        RecorderBuilder::default()
    }

    #[must_use]
    pub fn version_strategy(&self) -> &dyn VersionStrategy {
        self.version.as_ref()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether `entity` gets a history entry.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::UnsupportedOperation` for a recordable entity
    /// whose primary key is missing or still zero.
    pub fn inspect<'a, E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &'a E,
    ) -> Result<Inspection<'a>, HistoryError> {
        if !self.enabled || ctx.is_disabled() {
            return Ok(Inspection::Skipped(SkipReason::Disabled));
        }
        let Some(recordable) = entity.as_recordable() else {
            return Ok(Inspection::Skipped(SkipReason::NotRecordable));
        };

        let identity = resolve_identity(entity)?;
        if identity.is_zero {
            return Err(HistoryError::UnsupportedOperation(format!(
                "primary key '{}' of {} has no value",
                identity.field,
                E::layout().table()
            )));
        }

        Ok(Inspection::Eligible {
            recordable,
            identity,
        })
    }

    /// Build the history row for one eligible entity.
    ///
    /// # Errors
    ///
    /// Returns `Transform` if the copy fails, `Config` if the history layout
    /// lacks a required role, or `VersionGeneration` if no version could be
    /// minted.
    pub async fn assemble<E: Model>(
        &self,
        ctx: &RecordingContext,
        store: &dyn HistoryStore,
        action: Action,
        entity: &E,
        recordable: &dyn Recordable,
        identity: &Identity,
    ) -> Result<HistoryRow, HistoryError> {
        let source = to_fields(entity)?;
        let mut history = snapshot_fields(&source, recordable, identity, &self.copy)?;
        let roles = RoleMap::resolve(history.history_layout())?;
        let object_id = identity.object_id();

        history.set_history_action(action);
        history.set_history_object_id(object_id.clone());

        let version = self
            .version
            .next(&VersionContext {
                action,
                object_id: &object_id,
                roles: &roles,
                store,
                entity: &source,
                history: history.as_ref(),
            })
            .await?;
        debug!(%action, table = roles.table(), object_id = %object_id, %version, "history entry assembled");
        history.set_history_version(version);

        if let Some(t) = history.as_timestampable() {
            t.set_history_created_at((self.clock)());
        }
        if let (Some(b), Some(user)) = (history.as_blameable(), ctx.user()) {
            b.set_history_user_id(&user.id);
            b.set_history_user_email(&user.email);
        }
        if let (Some(s), Some(source)) = (history.as_sourceable(), ctx.source()) {
            s.set_history_source_id(&source.id);
            s.set_history_source_type(&source.source_type);
        }

        let mut row = HistoryRow::from_history(history.as_ref())?;
        if self.version.assigned_on_insert() && !action.is_initial() {
            row.next_version = Some(NextVersion {
                object_id_column: roles.object_id(),
                version_column: roles.version(),
                object_id,
            });
        }
        Ok(row)
    }

    /// Inspect every element of `target`, assemble the eligible ones, then
    /// persist them in element order.
    ///
    /// # Errors
    ///
    /// Any inspection, assembly, or persistence error. Nothing is written
    /// when inspection or assembly fails.
    pub async fn record<E: Model>(
        &self,
        ctx: &RecordingContext,
        store: &dyn HistoryStore,
        action: Action,
        target: Target<'_, E>,
    ) -> Result<Outcome, HistoryError> {
        if !self.enabled || ctx.is_disabled() {
            debug!(%action, "history recording disabled");
            return Ok(Outcome::Skipped(SkipReason::Disabled));
        }

        let entities: &[E] = match target {
            Target::Unknown => return Ok(self.after_untyped(action)),
            Target::One(entity) => std::slice::from_ref(entity),
            Target::Many(entities) => entities,
        };

        let mut eligible = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.inspect(ctx, entity) {
                Ok(Inspection::Eligible {
                    recordable,
                    identity,
                }) => eligible.push((entity, recordable, identity)),
                Ok(Inspection::Skipped(_)) => {}
                Err(e) => {
                    warn!(%action, table = E::layout().table(), error = %e, "history rejected");
                    return Err(e);
                }
            }
        }

        if eligible.is_empty() {
            return Ok(Outcome::Skipped(SkipReason::NotRecordable));
        }

        let mut rows = Vec::with_capacity(eligible.len());
        for (entity, recordable, identity) in &eligible {
            rows.push(
                self.assemble(ctx, store, action, *entity, *recordable, identity)
                    .await?,
            );
        }

        let written = persist(store, &rows).await?;
        debug!(%action, table = E::layout().table(), written, "history recorded");
        Ok(Outcome::Persisted(written))
    }

    /// A write with no entity schema behind it, such as raw SQL.
    #[must_use]
    pub fn after_untyped(&self, action: Action) -> Outcome {
        debug!(%action, "no entity schema, skipping history");
        Outcome::Skipped(SkipReason::UnknownSchema)
    }

    /// # Errors
    ///
    /// See [`Recorder::record`].
    pub async fn after_create<E: Model>(
        &self,
        ctx: &RecordingContext,
        store: &dyn HistoryStore,
        target: Target<'_, E>,
    ) -> Result<Outcome, HistoryError> {
        self.record(ctx, store, Action::Create, target).await
    }

    /// # Errors
    ///
    /// See [`Recorder::record`].
    pub async fn after_update<E: Model>(
        &self,
        ctx: &RecordingContext,
        store: &dyn HistoryStore,
        target: Target<'_, E>,
    ) -> Result<Outcome, HistoryError> {
        self.record(ctx, store, Action::Update, target).await
    }

    /// # Errors
    ///
    /// See [`Recorder::record`].
    pub async fn after_delete<E: Model>(
        &self,
        ctx: &RecordingContext,
        store: &dyn HistoryStore,
        target: Target<'_, E>,
    ) -> Result<Outcome, HistoryError> {
        self.record(ctx, store, Action::Delete, target).await
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("copy", &self.copy)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Write `rows` one by one, stopping at the first failure.
///
/// Rows written before the failure stay written.
///
/// # Errors
///
/// The first error returned by the store.
pub async fn persist(store: &dyn HistoryStore, rows: &[HistoryRow]) -> Result<usize, HistoryError> {
    for (written, row) in rows.iter().enumerate() {
        if let Err(e) = store.insert(row).await {
            warn!(table = row.table, written, error = %e, "history write failed");
            return Err(e);
        }
    }
    Ok(rows.len())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct RecorderBuilder {
    version: Option<Arc<dyn VersionStrategy>>,
    copy: CopyStrategy,
    clock: Clock,
    enabled: bool,
}

impl Default for RecorderBuilder {
    fn default() -> Self {
        Self {
            version: None,
            copy: CopyStrategy::Structural,
            clock: Utc::now,
            enabled: true,
        }
    }
}

impl RecorderBuilder {
    #[must_use]
    pub fn version_strategy(mut self, strategy: Arc<dyn VersionStrategy>) -> Self {
        self.version = Some(strategy);
        self
    }

    #[must_use]
    pub fn version_kind(mut self, kind: VersionStrategyKind) -> Self {
        self.version = Some(strategy_for(kind));
        self
    }

    #[must_use]
    pub fn copy_strategy(mut self, copy: CopyStrategy) -> Self {
        self.copy = copy;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> Recorder {
        Recorder {
            version: self
                .version
                .unwrap_or_else(|| Arc::new(UlidVersion::new())),
            copy: self.copy,
            clock: self.clock,
            enabled: self.enabled,
        }
    }
}
