//! Conversions between serde field maps and libSQL rows.
//!
//! Entities and history records travel through the engine as
//! `serde_json::Map`s. These helpers turn those values into statement
//! parameters and turn column values back into JSON, guided by the declared
//! [`ColumnKind`].

use chron_core::{Column, ColumnKind, Fields};
use serde_json::{Number, Value};

use crate::error::DatabaseError;

/// Quote an identifier for use in SQL text.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Comma-separated, quoted column names.
#[must_use]
pub fn select_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON value to statement parameter.
///
/// Booleans become 0/1, nested arrays and objects are stored as JSON text.
#[must_use]
pub fn to_sql_value(value: &Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                libsql::Value::Integer(i)
            } else if n.is_u64() {
                // Above i64::MAX: keep every digit.
                libsql::Value::Text(n.to_string())
            } else {
                libsql::Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => libsql::Value::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => libsql::Value::Text(value.to_string()),
    }
}

/// Column value to JSON, interpreted through the declared kind.
#[must_use]
pub fn from_sql_value(value: libsql::Value, kind: ColumnKind) -> Value {
    match value {
        libsql::Value::Null => Value::Null,
        libsql::Value::Integer(i) if kind == ColumnKind::Boolean => Value::Bool(i != 0),
        libsql::Value::Integer(i) => Value::Number(i.into()),
        libsql::Value::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        libsql::Value::Text(s) => Value::String(s),
        libsql::Value::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
    }
}

/// Read a row selected with [`select_list`] over the same `columns`.
///
/// # Errors
///
/// Returns `DatabaseError::LibSql` if a column cannot be read.
pub fn row_to_fields(row: &libsql::Row, columns: &[Column]) -> Result<Fields, DatabaseError> {
    let mut fields = Fields::new();
    for (idx, column) in (0_i32..).zip(columns) {
        let value = row.get_value(idx)?;
        fields.insert(column.name.to_string(), from_sql_value(value, column.kind));
    }
    Ok(fields)
}
