//! Recorded entity writes.
//!
//! Each method runs the entity statement, then hands the written entities to
//! the recorder. Errors from either step are returned; a recording failure
//! does not undo the entity write. Batch writes are all-or-nothing: a failed
//! element rolls back the whole batch before anything is recorded.

use chron_core::schema::{from_fields, resolve_identity, to_fields};
use chron_core::{Action, Column, Fields, Model, Outcome, RecordingContext, Target};
use libsql::params::IntoParams;
use serde_json::Value;

use crate::error::DatabaseError;
use crate::helpers::{from_sql_value, quote_ident, row_to_fields, select_list, to_sql_value};
use crate::service::HistoryService;

fn primary_key<E: Model>() -> Result<&'static Column, DatabaseError> {
    let layout = E::layout();
    layout.primary_key().ok_or_else(|| {
        DatabaseError::InvalidState(format!("table '{}' declares no primary key", layout.table()))
    })
}

/// Non-null patch entries in layout order. The primary key is never patched.
fn patch_values<E: Model>(patch: &Fields) -> Result<Vec<(&'static str, Value)>, DatabaseError> {
    let layout = E::layout();
    if let Some(unknown) = patch.keys().find(|name| layout.get(name).is_none()) {
        return Err(DatabaseError::Query(format!(
            "unknown column '{unknown}' on {}",
            layout.table()
        )));
    }

    Ok(layout
        .columns()
        .iter()
        .filter(|c| !c.is_primary_key())
        .filter_map(|c| match patch.get(c.name) {
            Some(value) if !value.is_null() => Some((c.name, value.clone())),
            _ => None,
        })
        .collect())
}

/// Roll back `tx` and hand back the error that caused it.
async fn abort(tx: libsql::Transaction, err: DatabaseError) -> DatabaseError {
    if let Err(rollback) = tx.rollback().await {
        tracing::warn!(error = %rollback, "batch rollback failed");
    }
    err
}

impl HistoryService {
    /// Insert `entity`, writing the storage-assigned key back into it.
    async fn insert_entity<E: Model>(&self, entity: &mut E) -> Result<(), DatabaseError> {
        let layout = E::layout();
        let pk = layout.primary_key();
        let mut fields = to_fields(entity)?;

        let values: Vec<(&str, Value)> = layout
            .columns()
            .iter()
            .filter_map(|c| {
                let value = fields.get(c.name).cloned().unwrap_or(Value::Null);
                let unassigned = c.is_primary_key() && E::is_zero_identity(&value);
                (!unassigned).then_some((c.name, value))
            })
            .collect();

        let assigned = self
            .db()
            .insert_values(layout.table(), &values, None, pk.map(|c| c.name))
            .await?;

        if let (Some(pk), Some(value)) = (pk, assigned) {
            fields.insert(pk.name.to_string(), from_sql_value(value, pk.kind));
            *entity = from_fields(fields)?;
        }
        Ok(())
    }

    /// Overwrite every non-key column of the row identified by `entity`.
    async fn update_entity<E: Model>(&self, entity: &E) -> Result<u64, DatabaseError> {
        let layout = E::layout();
        let pk = primary_key::<E>()?;
        let fields = to_fields(entity)?;

        let sets: Vec<(&str, Value)> = layout
            .columns()
            .iter()
            .filter(|c| !c.is_primary_key())
            .map(|c| (c.name, fields.get(c.name).cloned().unwrap_or(Value::Null)))
            .collect();
        let id = fields.get(pk.name).cloned().unwrap_or(Value::Null);

        self.update_where(layout.table(), &sets, Some((pk.name, &id)))
            .await
    }

    async fn update_where(
        &self,
        table: &str,
        sets: &[(&str, Value)],
        key: Option<(&str, &Value)>,
    ) -> Result<u64, DatabaseError> {
        if sets.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", quote_ident(name), i + 1))
            .collect();
        let mut params: Vec<libsql::Value> = sets.iter().map(|(_, v)| to_sql_value(v)).collect();
        let mut sql = format!("UPDATE {} SET {}", quote_ident(table), assignments.join(", "));

        if let Some((column, value)) = key {
            params.push(to_sql_value(value));
            sql.push_str(&format!(" WHERE {} = ?{}", quote_ident(column), params.len()));
        }

        self.db()
            .execute(&sql, libsql::params_from_iter(params))
            .await
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Insert `entity` and record a Create entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails or recording fails.
    pub async fn create<E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &mut E,
    ) -> Result<Outcome, DatabaseError> {
        self.insert_entity(entity).await?;
        Ok(self
            .recorder()
            .after_create(ctx, self.db(), Target::One(&*entity))
            .await?)
    }

    /// Insert every element in one transaction, then record the batch.
    ///
    /// When an insert fails the batch is rolled back and nothing is
    /// recorded. Keys already written back into earlier elements are stale
    /// in that case.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if an insert fails or recording fails.
    pub async fn create_many<E: Model>(
        &self,
        ctx: &RecordingContext,
        entities: &mut [E],
    ) -> Result<Outcome, DatabaseError> {
        let tx = self.db().begin_immediate().await?;
        for entity in entities.iter_mut() {
            if let Err(e) = self.insert_entity(entity).await {
                return Err(abort(tx, e).await);
            }
        }
        tx.commit().await?;
        Ok(self
            .recorder()
            .after_create(ctx, self.db(), Target::Many(&*entities))
            .await?)
    }

    /// Insert when the key is zero, update otherwise. An update that matches
    /// no row falls back to an insert with the given key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write fails or recording fails.
    pub async fn save<E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &mut E,
    ) -> Result<Outcome, DatabaseError> {
        let identity = resolve_identity(&*entity)?;
        if identity.is_zero {
            return self.create(ctx, entity).await;
        }

        if self.update_entity(&*entity).await? == 0 {
            return self.create(ctx, entity).await;
        }
        Ok(self
            .recorder()
            .after_update(ctx, self.db(), Target::One(&*entity))
            .await?)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Write all columns of `entity` by key and record an Update entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails or recording fails,
    /// including the rejection of an entity whose key is zero.
    pub async fn update<E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &E,
    ) -> Result<Outcome, DatabaseError> {
        let changed = self.update_entity(entity).await?;
        tracing::debug!(table = E::layout().table(), changed, "entity updated");
        Ok(self
            .recorder()
            .after_update(ctx, self.db(), Target::One(entity))
            .await?)
    }

    /// Update every element in one transaction, then record the batch.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if an update fails (the batch is rolled back)
    /// or recording fails.
    pub async fn update_many<E: Model>(
        &self,
        ctx: &RecordingContext,
        entities: &[E],
    ) -> Result<Outcome, DatabaseError> {
        let tx = self.db().begin_immediate().await?;
        for entity in entities {
            if let Err(e) = self.update_entity(entity).await {
                return Err(abort(tx, e).await);
            }
        }
        tx.commit().await?;
        Ok(self
            .recorder()
            .after_update(ctx, self.db(), Target::Many(entities))
            .await?)
    }

    /// Write the non-null fields of `patch` onto the row identified by
    /// `entity`, reload `entity` from storage, and record its full state.
    ///
    /// # Errors
    ///
    /// `Query` for a patch key that is not a column, or any write or
    /// recording failure.
    pub async fn update_columns<E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &mut E,
        patch: &Fields,
    ) -> Result<Outcome, DatabaseError> {
        let pk = primary_key::<E>()?;
        let identity = resolve_identity(&*entity)?;
        let sets = patch_values::<E>(patch)?;

        self.update_where(E::layout().table(), &sets, Some((pk.name, &identity.value)))
            .await?;

        if !identity.is_zero {
            if let Some(fresh) = self.find::<E>(&identity.value).await? {
                *entity = fresh;
            }
        }
        Ok(self
            .recorder()
            .after_update(ctx, self.db(), Target::One(&*entity))
            .await?)
    }

    /// Write `patch` to every row of `E`'s table.
    ///
    /// The rows have no per-row identity at recording time, so a tracked
    /// `E` is rejected with `UnsupportedOperation` after the write.
    ///
    /// # Errors
    ///
    /// `Query` for an unknown patch key, the write failure, or the rejection.
    pub async fn update_all<E: Model + Default>(
        &self,
        ctx: &RecordingContext,
        patch: &Fields,
    ) -> Result<Outcome, DatabaseError> {
        let table = E::layout().table();
        let sets = patch_values::<E>(patch)?;
        let changed = self.update_where(table, &sets, None).await?;
        tracing::debug!(table, changed, "bulk update without row identity");

        let unidentified = E::default();
        Ok(self
            .recorder()
            .after_update(ctx, self.db(), Target::One(&unidentified))
            .await?)
    }

    // -----------------------------------------------------------------------
    // Delete / raw
    // -----------------------------------------------------------------------

    /// Delete the row identified by `entity` and record a Delete entry
    /// holding its last state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails or recording fails.
    pub async fn delete<E: Model>(
        &self,
        ctx: &RecordingContext,
        entity: &E,
    ) -> Result<Outcome, DatabaseError> {
        let layout = E::layout();
        let pk = primary_key::<E>()?;
        let id = to_fields(entity)?
            .remove(pk.name)
            .unwrap_or(Value::Null);

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(layout.table()),
            quote_ident(pk.name)
        );
        self.db()
            .execute(&sql, libsql::params_from_iter([to_sql_value(&id)]))
            .await?;

        Ok(self
            .recorder()
            .after_delete(ctx, self.db(), Target::One(entity))
            .await?)
    }

    /// Run a statement that has no entity type behind it. Never recorded.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the statement fails.
    pub async fn execute_raw(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<Outcome, DatabaseError> {
        let changed = self.db().execute(sql, params).await?;
        tracing::debug!(changed, "raw statement executed");
        Ok(self.recorder().after_untyped(Action::Update))
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Load the entity whose primary key equals `id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the row does not fit `E`.
    pub async fn find<E: Model>(&self, id: &Value) -> Result<Option<E>, DatabaseError> {
        let layout = E::layout();
        let pk = primary_key::<E>()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            select_list(layout.columns()),
            quote_ident(layout.table()),
            quote_ident(pk.name)
        );

        let mut rows = self
            .db()
            .query(&sql, libsql::params_from_iter([to_sql_value(id)]))
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(from_fields(row_to_fields(&row, layout.columns())?)?))
    }
}
