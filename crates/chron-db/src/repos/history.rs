//! Reading history entries back.

use chron_core::schema::from_fields;
use chron_core::{Model, RoleMap};

use crate::error::DatabaseError;
use crate::helpers::{quote_ident, row_to_fields, select_list};
use crate::service::HistoryService;

impl HistoryService {
    /// Entries recorded for `object_id`, oldest version first.
    ///
    /// # Errors
    ///
    /// `History(Config)` if `H` lacks object-id or version roles, or any
    /// query or decoding failure.
    pub async fn history_of<H: Model>(&self, object_id: &str) -> Result<Vec<H>, DatabaseError> {
        let layout = H::layout();
        let roles = RoleMap::resolve(layout)?;

        let mut order = vec![quote_ident(roles.version())];
        if let Some(pk) = layout.primary_key() {
            order.push(quote_ident(pk.name));
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY {}",
            select_list(layout.columns()),
            quote_ident(layout.table()),
            quote_ident(roles.object_id()),
            order.join(", ")
        );

        let mut rows = self.db().query(&sql, [object_id]).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(from_fields(row_to_fields(&row, layout.columns())?)?);
        }
        Ok(entries)
    }

    /// Number of rows in `H`'s table.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history_count<H: Model>(&self) -> Result<u64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(H::layout().table()));
        let mut rows = self.db().query(&sql, ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        u64::try_from(count).map_err(|e| DatabaseError::InvalidState(e.to_string()))
    }
}
