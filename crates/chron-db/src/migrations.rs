//! `CREATE TABLE` from declared layouts.
//!
//! Statements use `IF NOT EXISTS`, so bootstrapping the same layout twice is
//! harmless. History tables (layouts with object-id and version roles) also
//! get a unique index on `(object_id, version)`: it serves max-version
//! lookups and refuses a second entry with the same version for one object.

use chron_core::{Column, ColumnKind, Layout, Role};

use crate::ChronDb;
use crate::error::DatabaseError;
use crate::helpers::quote_ident;

impl ChronDb {
    /// Create the table (and history index) for `layout` if missing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if the DDL fails.
    pub async fn ensure_table(&self, layout: &Layout) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(&create_table_sql(layout))
            .await
            .map_err(|e| DatabaseError::Migration(format!("{}: {e}", layout.table())))?;
        Ok(())
    }
}

fn column_def(column: &Column) -> String {
    let name = quote_ident(column.name);
    let sql_type = column.kind.sql_type();
    match (column.is_primary_key(), column.kind) {
        (true, ColumnKind::Integer) => format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"),
        (true, _) => format!("{name} {sql_type} PRIMARY KEY"),
        (false, ColumnKind::Any) => name,
        (false, _) => format!("{name} {sql_type}"),
    }
}

pub(crate) fn create_table_sql(layout: &Layout) -> String {
    let table = layout.table();
    let columns: Vec<String> = layout.columns().iter().map(column_def).collect();
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        quote_ident(table),
        columns.join(",\n    ")
    );

    if let (Some(object_id), Some(version)) = (
        layout.column_for(Role::ObjectId),
        layout.column_for(Role::Version),
    ) {
        let index = format!("idx_{table}_{}_{}", object_id.name, version.name);
        sql.push_str(&format!(
            "\nCREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({}, {});",
            quote_ident(&index),
            quote_ident(table),
            quote_ident(object_id.name),
            quote_ident(version.name)
        ));
    }

    sql
}
