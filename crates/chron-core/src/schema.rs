//! Statically declared table layouts, semantic roles, and identity resolution.
//!
//! Every stored record implements [`Model`] and declares its [`Layout`]: the
//! table name plus one [`Column`] per serialized field. Columns may carry a
//! [`Role`] naming their meaning to the recording engine (primary key,
//! version, object id, ...). Column names are the serde field names.
//!
//! A history type that embeds [`Entry`](crate::entry::Entry) with
//! `#[serde(flatten)]` contributes the entry's columns through
//! [`Layout::embed`], which is how roles are found "one level down".

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::entry::Recordable;
use crate::errors::HistoryError;

/// A serialized record: field name to JSON value.
pub type Fields = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Semantic meaning of a column to the recording engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    PrimaryKey,
    Version,
    ObjectId,
    Action,
    CreatedAt,
    UserId,
    UserEmail,
    SourceId,
    SourceType,
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Boolean,
    /// RFC 3339 text.
    Timestamp,
    /// No declared affinity; holds either text or integer values.
    Any,
}

impl ColumnKind {
    /// SQL type name used when creating a table. `Any` has none.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
            Self::Text | Self::Timestamp => "TEXT",
            Self::Any => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub role: Option<Role>,
}

impl Column {
    #[must_use]
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            role: None,
        }
    }

    /// An integer primary key, assigned by storage when left at zero.
    #[must_use]
    pub const fn primary_key(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Integer,
            role: Some(Role::PrimaryKey),
        }
    }

    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.role == Some(Role::PrimaryKey)
    }
}

/// Table name and columns of a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    table: &'static str,
    columns: Vec<Column>,
}

impl Layout {
    #[must_use]
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append the columns of an embedded (flattened) struct.
    #[must_use]
    pub fn embed(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First column declaring `role`.
    #[must_use]
    pub fn column_for(&self, role: Role) -> Option<&Column> {
        self.columns.iter().find(|c| c.role == Some(role))
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&Column> {
        self.column_for(Role::PrimaryKey)
    }
}

// ---------------------------------------------------------------------------
// RoleMap
// ---------------------------------------------------------------------------

/// Role to column mapping resolved from a history layout.
///
/// Resolution fails when the layout lacks an object-id or version column:
/// the engine cannot address or order entries of such a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap {
    table: &'static str,
    columns: HashMap<Role, &'static str>,
}

impl RoleMap {
    /// # Errors
    ///
    /// Returns `HistoryError::Config` if `Role::ObjectId` or `Role::Version`
    /// is not declared on any column.
    pub fn resolve(layout: &Layout) -> Result<Self, HistoryError> {
        let mut columns = HashMap::new();
        for column in layout.columns() {
            if let Some(role) = column.role {
                columns.entry(role).or_insert(column.name);
            }
        }

        for required in [Role::ObjectId, Role::Version] {
            if !columns.contains_key(&required) {
                return Err(HistoryError::Config(format!(
                    "history table '{}' declares no {required:?} column",
                    layout.table()
                )));
            }
        }

        Ok(Self {
            table: layout.table(),
            columns,
        })
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    #[must_use]
    pub fn column(&self, role: Role) -> Option<&'static str> {
        self.columns.get(&role).copied()
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        self.columns.get(&Role::Version).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn object_id(&self) -> &'static str {
        self.columns.get(&Role::ObjectId).copied().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A record stored by the application, tracked or not.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    fn layout() -> &'static Layout;

    /// The produces-history capability. Tracked entities return `Some(self)`.
    fn as_recordable(&self) -> Option<&dyn Recordable> {
        None
    }

    /// Whether a primary key value means "not yet assigned".
    ///
    /// Override for id types with their own notion of zero.
    fn is_zero_identity(value: &Value) -> bool {
        is_zero_value(value)
    }
}

/// Null, `0`, `""`, and `false` are zero.
#[must_use]
pub fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Serialize a record into its field map.
///
/// # Errors
///
/// Returns `HistoryError::Transform` if the value does not serialize to an
/// object (there is no field to address).
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> Result<Fields, HistoryError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(HistoryError::Transform(format!(
            "expected a struct, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(HistoryError::Transform(e.to_string())),
    }
}

/// Deserialize a record from its field map.
///
/// # Errors
///
/// Returns `HistoryError::Transform` if the fields cannot be reconciled with
/// the target type.
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T, HistoryError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| HistoryError::Transform(e.to_string()))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The primary identity of an entity at recording time.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub field: &'static str,
    pub value: Value,
    pub is_zero: bool,
}

impl Identity {
    /// Stringified identity stored in the history entry's object-id column.
    #[must_use]
    pub fn object_id(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Resolve the primary key field, value, and zero-ness of `entity`.
///
/// # Errors
///
/// Returns `HistoryError::UnsupportedOperation` if the layout declares no
/// primary key, or `HistoryError::Transform` if the entity does not serialize
/// to a struct.
pub fn resolve_identity<E: Model>(entity: &E) -> Result<Identity, HistoryError> {
    let layout = E::layout();
    let pk = layout.primary_key().ok_or_else(|| {
        HistoryError::UnsupportedOperation(format!(
            "primary key field could not be determined for table '{}'",
            layout.table()
        ))
    })?;

    let fields = to_fields(entity)?;
    let value = fields.get(pk.name).cloned().unwrap_or(Value::Null);
    let is_zero = E::is_zero_identity(&value);

    Ok(Identity {
        field: pk.name,
        value,
        is_zero,
    })
}
