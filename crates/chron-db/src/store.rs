use async_trait::async_trait;
use chron_core::{HistoryError, HistoryRow, HistoryStore, MaxVersionQuery, NextVersion};
use serde_json::Value;

use crate::ChronDb;
use crate::error::DatabaseError;
use crate::helpers::{quote_ident, to_sql_value};

impl ChronDb {
    /// Insert one row built from `(column, value)` pairs.
    ///
    /// With `next_version`, the named version column is computed by a
    /// subquery inside the same statement instead of bound from `values`.
    /// With `returning`, the named column of the new row is read back (the
    /// storage-assigned primary key, typically).
    pub(crate) async fn insert_values(
        &self,
        table: &str,
        values: &[(&str, Value)],
        next_version: Option<&NextVersion>,
        returning: Option<&str>,
    ) -> Result<Option<libsql::Value>, DatabaseError> {
        let mut params: Vec<libsql::Value> = Vec::with_capacity(values.len());
        let mut placeholders: Vec<String> = Vec::with_capacity(values.len());
        for (i, (name, value)) in values.iter().enumerate() {
            let index = i + 1;
            match next_version {
                Some(next) if next.version_column == *name => {
                    placeholders.push(format!(
                        "(SELECT COALESCE(MAX({}), 0) + 1 FROM {} WHERE {} = ?{index})",
                        quote_ident(next.version_column),
                        quote_ident(table),
                        quote_ident(next.object_id_column)
                    ));
                    params.push(libsql::Value::Text(next.object_id.clone()));
                }
                _ => {
                    placeholders.push(format!("?{index}"));
                    params.push(to_sql_value(value));
                }
            }
        }

        let mut sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
        } else {
            let columns: Vec<String> = values.iter().map(|(name, _)| quote_ident(name)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let Some(column) = returning else {
            self.conn
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            return Ok(None);
        };

        sql.push_str(&format!(" RETURNING {}", quote_ident(column)));
        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(Some(row.get_value(0)?))
    }

    async fn max_integer(&self, query: &MaxVersionQuery<'_>) -> Result<Option<i64>, DatabaseError> {
        let sql = format!(
            "SELECT MAX({}) FROM {} WHERE {} = ?1",
            quote_ident(query.version_column),
            quote_ident(query.table),
            quote_ident(query.object_id_column)
        );
        let mut rows = self.conn.query(&sql, [query.object_id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        match row.get_value(0)? {
            libsql::Value::Null => Ok(None),
            libsql::Value::Integer(max) => Ok(Some(max)),
            other => Err(DatabaseError::InvalidState(format!(
                "non-integer version {other:?} in {}.{}",
                query.table, query.version_column
            ))),
        }
    }
}

#[async_trait]
impl HistoryStore for ChronDb {
    async fn insert(&self, row: &HistoryRow) -> Result<(), HistoryError> {
        self.insert_values(row.table, &row.values, row.next_version.as_ref(), None)
            .await?;
        tracing::debug!(
            table = row.table,
            assigned_version = row.next_version.is_some(),
            "history row written"
        );
        Ok(())
    }

    async fn max_version(&self, query: &MaxVersionQuery<'_>) -> Result<Option<i64>, HistoryError> {
        Ok(self.max_integer(query).await?)
    }
}
