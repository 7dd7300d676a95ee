//! Repository for the reference tables (countries, cities, categories,
//! hotels, guides, drivers, tour blocks).
//!
//! Every reference table has the same columns, so one repository serves all
//! kinds and picks the table from [`ReferenceKind`].

use async_trait::async_trait;
use domain::models::reference::{
    NewReference, ReferenceChanges, ReferenceFilter, ReferenceItem, ReferenceKind,
};
use domain::store::{ReferenceStore, StoreError, StoreResult};
use shared::retry::RetryPolicy;
use sqlx::PgPool;

use crate::entities::{ReferenceEntity, REFERENCE_COLUMNS};
use crate::error::{store_error, with_db_retry};
use crate::metrics::QueryTimer;

/// Repository for reference entity database operations.
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

fn not_found(kind: ReferenceKind) -> StoreError {
    StoreError::NotFound(kind.display_name().to_string())
}

#[async_trait]
impl ReferenceStore for ReferenceRepository {
    async fn list_references(
        &self,
        kind: ReferenceKind,
        filter: &ReferenceFilter,
    ) -> StoreResult<Vec<ReferenceItem>> {
        let timer = QueryTimer::new(format!("list_{}", kind.table()));
        let sql = format!(
            r#"
            SELECT {columns} FROM {table}
            WHERE ($1::BIGINT IS NULL OR parent_id = $1)
              AND ($2 OR is_active = TRUE)
            ORDER BY id
            "#,
            columns = REFERENCE_COLUMNS,
            table = kind.table(),
        );
        let rows = with_db_retry(&self.retry, "list_references", || {
            sqlx::query_as::<_, ReferenceEntity>(&sql)
                .bind(filter.parent_id)
                .bind(filter.include_inactive)
                .fetch_all(&self.pool)
        })
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(|row| row.into_item(kind)).collect())
    }

    async fn find_reference(
        &self,
        kind: ReferenceKind,
        id: i64,
    ) -> StoreResult<Option<ReferenceItem>> {
        let timer = QueryTimer::new(format!("find_{}", kind.table()));
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            REFERENCE_COLUMNS,
            kind.table()
        );
        let row = with_db_retry(&self.retry, "find_reference", || {
            sqlx::query_as::<_, ReferenceEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await;
        timer.finish(&row);

        Ok(row?.map(|row| row.into_item(kind)))
    }

    async fn parent_ids(
        &self,
        kind: ReferenceKind,
        ids: &[i64],
    ) -> StoreResult<Vec<(i64, Option<i64>)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT id, parent_id FROM {} WHERE id = ANY($1)", kind.table());
        with_db_retry(&self.retry, "reference_parent_ids", || {
            sqlx::query_as::<_, (i64, Option<i64>)>(&sql)
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
        })
        .await
    }

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: NewReference,
    ) -> StoreResult<ReferenceItem> {
        let timer = QueryTimer::new(format!("create_{}", kind.table()));
        let row = sqlx::query_as::<_, ReferenceEntity>(&format!(
            r#"
            INSERT INTO {table} (name, description, address, parent_id, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {columns}
            "#,
            table = kind.table(),
            columns = REFERENCE_COLUMNS,
        ))
        .bind(new.name.to_value())
        .bind(new.description.as_ref().map(|d| d.to_value()))
        .bind(new.address.as_ref().map(|a| a.to_value()))
        .bind(new.parent_id)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        Ok(row?.into_item(kind))
    }

    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i64,
        changes: ReferenceChanges,
    ) -> StoreResult<ReferenceItem> {
        let timer = QueryTimer::new(format!("update_{}", kind.table()));
        let row = sqlx::query_as::<_, ReferenceEntity>(&format!(
            r#"
            UPDATE {table} SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                address = COALESCE($4, address),
                parent_id = COALESCE($5, parent_id),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {columns}
            "#,
            table = kind.table(),
            columns = REFERENCE_COLUMNS,
        ))
        .bind(id)
        .bind(changes.name.as_ref().map(|n| n.to_value()))
        .bind(changes.description.as_ref().map(|d| d.to_value()))
        .bind(changes.address.as_ref().map(|a| a.to_value()))
        .bind(changes.parent_id)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        row?.map(|row| row.into_item(kind))
            .ok_or_else(|| not_found(kind))
    }

    async fn delete_reference(&self, kind: ReferenceKind, id: i64) -> StoreResult<bool> {
        let timer = QueryTimer::new(format!("delete_{}", kind.table()));
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) => Err(match store_error(e) {
                StoreError::InvalidReference(_) => StoreError::Conflict(format!(
                    "{} is still referenced by other records",
                    kind.display_name()
                )),
                other => other,
            }),
        }
    }
}
