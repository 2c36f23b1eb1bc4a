//! Copying an entity's state into a fresh history record.

use std::fmt;
use std::sync::Arc;

use crate::entry::{History, Recordable};
use crate::errors::HistoryError;
use crate::schema::{Fields, Identity, Model, to_fields};

/// A caller-supplied copy routine: `source` entity fields into `target`
/// history fields.
pub type CopyFn = Arc<dyn Fn(&Fields, &mut Fields) -> Result<(), HistoryError> + Send + Sync>;

/// How entity fields reach the history record.
#[derive(Clone, Default)]
pub enum CopyStrategy {
    /// Same-named fields are copied; nulls never overwrite.
    #[default]
    Structural,
    Custom(CopyFn),
}

impl CopyStrategy {
    pub fn custom<F>(copy: F) -> Self
    where
        F: Fn(&Fields, &mut Fields) -> Result<(), HistoryError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(copy))
    }

    /// # Errors
    ///
    /// Propagates whatever a custom routine returns.
    pub fn apply(&self, source: &Fields, target: &mut Fields) -> Result<(), HistoryError> {
        match self {
            Self::Structural => {
                structural_copy(source, target);
                Ok(())
            }
            Self::Custom(copy) => copy(source, target),
        }
    }
}

impl fmt::Debug for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("Structural"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Copy every non-null source field whose name exists in `target`.
///
/// Nested values are copied whole. Fields only the source has are ignored.
pub fn structural_copy(source: &Fields, target: &mut Fields) {
    for (name, value) in source {
        if value.is_null() {
            continue;
        }
        if let Some(slot) = target.get_mut(name) {
            slot.clone_from(value);
        }
    }
}

/// Produce a history record holding `entity`'s state.
///
/// The history field named like the entity's primary key is reset to its
/// zero value, so the history row gets its own identity from storage.
///
/// # Errors
///
/// Returns `HistoryError::Transform` if either side is not a struct or the
/// copied fields no longer fit the history type.
pub fn snapshot<E: Model>(
    entity: &E,
    recordable: &dyn Recordable,
    identity: &Identity,
    strategy: &CopyStrategy,
) -> Result<Box<dyn History>, HistoryError> {
    snapshot_fields(&to_fields(entity)?, recordable, identity, strategy)
}

/// [`snapshot`] for an entity already flattened to `source` fields.
///
/// # Errors
///
/// Same as [`snapshot`].
pub fn snapshot_fields(
    source: &Fields,
    recordable: &dyn Recordable,
    identity: &Identity,
    strategy: &CopyStrategy,
) -> Result<Box<dyn History>, HistoryError> {
    let mut history = recordable.create_history();
    let mut target = history.to_fields()?;
    let zero_identity = target.get(identity.field).cloned();

    strategy.apply(source, &mut target)?;

    if let Some(zero) = zero_identity {
        target.insert(identity.field.to_string(), zero);
    }

    history.load_fields(target)?;
    Ok(history)
}
