//! History entry records and their capabilities.
//!
//! A history type is a plain serde struct mirroring its entity's fields and
//! embedding [`Entry`] with `#[serde(flatten)]`. [`impl_entry_history!`]
//! derives the [`History`] implementation for such a type; types that only
//! want part of the metadata implement [`History`] by hand and opt into the
//! capabilities they support.
//!
//! [`impl_entry_history!`]: crate::impl_entry_history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Action;
use crate::errors::HistoryError;
use crate::schema::{Column, ColumnKind, Fields, Layout, Role};
use crate::version::Version;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// The history type records when the entry was created.
pub trait Timestampable {
    fn set_history_created_at(&mut self, at: DateTime<Utc>);
}

/// The history type records the acting user.
pub trait Blameable {
    fn set_history_user_id(&mut self, id: &str);
    fn set_history_user_email(&mut self, email: &str);
}

/// The history type records where the change came from.
pub trait Sourceable {
    fn set_history_source_id(&mut self, id: &str);
    fn set_history_source_type(&mut self, source_type: &str);
}

/// A record that can hold one history entry.
pub trait History: Send + Sync {
    /// Layout of the history table, with at least the object-id and version
    /// roles declared.
    fn history_layout(&self) -> &'static Layout;

    fn set_history_version(&mut self, version: Version);
    fn set_history_object_id(&mut self, object_id: String);
    fn set_history_action(&mut self, action: Action);

    fn as_timestampable(&mut self) -> Option<&mut dyn Timestampable> {
        None
    }

    fn as_blameable(&mut self) -> Option<&mut dyn Blameable> {
        None
    }

    fn as_sourceable(&mut self) -> Option<&mut dyn Sourceable> {
        None
    }

    /// Current field values.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Transform` if the record is not a struct.
    fn to_fields(&self) -> Result<Fields, HistoryError>;

    /// Replace the record with `fields`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Transform` if `fields` do not fit the record.
    fn load_fields(&mut self, fields: Fields) -> Result<(), HistoryError>;
}

/// An entity that produces history.
pub trait Recordable: Sync {
    /// A fresh, zero-valued history record for this entity.
    fn create_history(&self) -> Box<dyn History>;
}

/// Which optional metadata a history type accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub timestamp: bool,
    pub blame: bool,
    pub source: bool,
}

impl Capabilities {
    pub fn probe(history: &mut dyn History) -> Self {
        Self {
            timestamp: history.as_timestampable().is_some(),
            blame: history.as_blameable().is_some(),
            source: history.as_sourceable().is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Standard history metadata, embedded in history types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub version: Version,
    pub object_id: String,
    pub action: Option<Action>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub source_id: Option<String>,
    pub source_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Columns contributed by an embedded entry, roles included.
    #[must_use]
    pub const fn columns() -> [Column; 8] {
        [
            Column::new("version", ColumnKind::Any).with_role(Role::Version),
            Column::new("object_id", ColumnKind::Text).with_role(Role::ObjectId),
            Column::new("action", ColumnKind::Text).with_role(Role::Action),
            Column::new("user_id", ColumnKind::Text).with_role(Role::UserId),
            Column::new("user_email", ColumnKind::Text).with_role(Role::UserEmail),
            Column::new("source_id", ColumnKind::Text).with_role(Role::SourceId),
            Column::new("source_type", ColumnKind::Text).with_role(Role::SourceType),
            Column::new("created_at", ColumnKind::Timestamp).with_role(Role::CreatedAt),
        ]
    }
}

impl Timestampable for Entry {
    fn set_history_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = Some(at);
    }
}

impl Blameable for Entry {
    fn set_history_user_id(&mut self, id: &str) {
        self.user_id = Some(id.to_string());
    }

    fn set_history_user_email(&mut self, email: &str) {
        self.user_email = Some(email.to_string());
    }
}

impl Sourceable for Entry {
    fn set_history_source_id(&mut self, id: &str) {
        self.source_id = Some(id.to_string());
    }

    fn set_history_source_type(&mut self, source_type: &str) {
        self.source_type = Some(source_type.to_string());
    }
}

/// Implement [`History`] for a serde type embedding [`Entry`] in `$field`.
///
/// The type must also implement [`Model`](crate::schema::Model) so its
/// layout is known.
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct PersonHistory {
///     id: u64,
///     first_name: String,
///     #[serde(flatten)]
///     entry: Entry,
/// }
///
/// impl_entry_history!(PersonHistory, entry);
/// ```
#[macro_export]
macro_rules! impl_entry_history {
    ($ty:ty, $field:ident) => {
        impl $crate::entry::History for $ty {
            fn history_layout(&self) -> &'static $crate::schema::Layout {
                <$ty as $crate::schema::Model>::layout()
            }

            fn set_history_version(&mut self, version: $crate::version::Version) {
                self.$field.version = version;
            }

            fn set_history_object_id(&mut self, object_id: String) {
                self.$field.object_id = object_id;
            }

            fn set_history_action(&mut self, action: $crate::enums::Action) {
                self.$field.action = Some(action);
            }

            fn as_timestampable(&mut self) -> Option<&mut dyn $crate::entry::Timestampable> {
                Some(&mut self.$field)
            }

            fn as_blameable(&mut self) -> Option<&mut dyn $crate::entry::Blameable> {
                Some(&mut self.$field)
            }

            fn as_sourceable(&mut self) -> Option<&mut dyn $crate::entry::Sourceable> {
                Some(&mut self.$field)
            }

            fn to_fields(
                &self,
            ) -> ::std::result::Result<$crate::schema::Fields, $crate::errors::HistoryError> {
                $crate::schema::to_fields(self)
            }

            fn load_fields(
                &mut self,
                fields: $crate::schema::Fields,
            ) -> ::std::result::Result<(), $crate::errors::HistoryError> {
                *self = $crate::schema::from_fields(fields)?;
                Ok(())
            }
        }
    };
}
