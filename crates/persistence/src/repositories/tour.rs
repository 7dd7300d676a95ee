//! Tour repository for database operations.
//!
//! A tour row and its seven join tables are always written in one
//! transaction. Join rows are replaced per kind with the full row set
//! computed by [`plan_links`], so the stored list and the legacy scalar
//! (the primary row) cannot drift apart.

use async_trait::async_trait;
use domain::models::association::{plan_links, AssociationLink, AssociationWrite, AssociationWrites};
use domain::models::reference::ReferenceKind;
use domain::models::tour::{
    check_publishable, LinkedReference, PublishError, TourChanges, TourDetails, TourDraft,
    TourListFilter,
};
use domain::store::{StoreError, StoreResult, TourStore};
use serde::Serialize;
use serde_json::Value;
use shared::retry::RetryPolicy;
use sqlx::{PgConnection, PgPool};
use std::collections::{BTreeMap, HashMap};

use crate::entities::{link_select_sql, LinkEntity, TourEntity, TOUR_COLUMNS};
use crate::error::{store_error, with_db_retry};
use crate::metrics::QueryTimer;

type LinkMap = BTreeMap<ReferenceKind, Vec<LinkedReference>>;

/// Repository for tour-related database operations.
#[derive(Clone)]
pub struct TourRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl TourRepository {
    /// Creates a new TourRepository with the given connection pool.
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn json_array<T: Serialize>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    )
}

async fn load_links(
    conn: &mut PgConnection,
    tour_ids: &[i64],
) -> Result<HashMap<i64, LinkMap>, sqlx::Error> {
    let mut by_tour: HashMap<i64, LinkMap> = HashMap::new();
    if tour_ids.is_empty() {
        return Ok(by_tour);
    }

    for kind in ReferenceKind::ALL {
        let rows = sqlx::query_as::<_, LinkEntity>(&link_select_sql(kind))
            .bind(tour_ids.to_vec())
            .fetch_all(&mut *conn)
            .await?;

        for row in rows {
            by_tour
                .entry(row.tour_id)
                .or_default()
                .entry(kind)
                .or_default()
                .push(row.into_linked(kind));
        }
    }

    Ok(by_tour)
}

async fn attach_links(
    conn: &mut PgConnection,
    rows: Vec<TourEntity>,
) -> Result<Vec<TourDetails>, sqlx::Error> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut links = load_links(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let links = links.remove(&row.id).unwrap_or_default();
            TourDetails {
                tour: row.into(),
                links,
            }
        })
        .collect())
}

async fn fetch_details(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<TourDetails>, sqlx::Error> {
    let row = sqlx::query_as::<_, TourEntity>(&format!(
        "SELECT {} FROM tours WHERE id = $1",
        TOUR_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(attach_links(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Locks the tour row for the rest of the transaction.
async fn lock_tour(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM tours WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(locked.is_some())
}

async fn existing_links(
    conn: &mut PgConnection,
    tour_id: i64,
    kind: ReferenceKind,
) -> Result<Vec<AssociationLink>, sqlx::Error> {
    let rows: Vec<(i64, bool, i32)> = sqlx::query_as(&format!(
        "SELECT {column}, is_primary, position FROM {join} WHERE tour_id = $1",
        column = kind.join_column(),
        join = kind.join_table(),
    ))
    .bind(tour_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(target_id, is_primary, position)| AssociationLink {
            target_id,
            is_primary,
            position,
        })
        .collect())
}

/// Applies every association write for one tour. Runs inside the caller's
/// transaction.
async fn apply_link_writes(
    conn: &mut PgConnection,
    tour_id: i64,
    writes: &AssociationWrites,
) -> Result<(), sqlx::Error> {
    for (kind, write) in writes {
        let existing = match write {
            AssociationWrite::Untouched => continue,
            AssociationWrite::Replace(_) => Vec::new(),
            AssociationWrite::SetPrimary(_) => existing_links(conn, tour_id, *kind).await?,
        };
        let Some(rows) = plan_links(&existing, write) else {
            continue;
        };

        sqlx::query(&format!(
            "DELETE FROM {} WHERE tour_id = $1",
            kind.join_table()
        ))
        .bind(tour_id)
        .execute(&mut *conn)
        .await?;

        if rows.is_empty() {
            continue;
        }

        let targets: Vec<i64> = rows.iter().map(|r| r.target_id).collect();
        let primaries: Vec<bool> = rows.iter().map(|r| r.is_primary).collect();
        let positions: Vec<i32> = rows.iter().map(|r| r.position).collect();

        sqlx::query(&format!(
            r#"
            INSERT INTO {join} (tour_id, {column}, is_primary, position)
            SELECT $1, target, is_primary, position
            FROM UNNEST($2::BIGINT[], $3::BOOLEAN[], $4::INTEGER[]) AS t(target, is_primary, position)
            "#,
            join = kind.join_table(),
            column = kind.join_column(),
        ))
        .bind(tour_id)
        .bind(targets)
        .bind(primaries)
        .bind(positions)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

const LIST_FILTER: &str = r#"
    WHERE ($1 OR t.is_draft = FALSE)
      AND ($2::BIGINT IS NULL OR EXISTS (
            SELECT 1 FROM tour_countries tc WHERE tc.tour_id = t.id AND tc.country_id = $2))
      AND ($3::BIGINT IS NULL OR EXISTS (
            SELECT 1 FROM tour_category_assignments tca
            WHERE tca.tour_id = t.id AND tca.category_id = $3))
"#;

impl TourRepository {
    async fn list_inner(
        &self,
        filter: &TourListFilter,
    ) -> Result<(Vec<TourDetails>, i64), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, TourEntity>(&format!(
            "SELECT {} FROM tours t {} ORDER BY t.created_at DESC, t.id DESC LIMIT $4 OFFSET $5",
            TOUR_COLUMNS, LIST_FILTER
        ))
        .bind(filter.include_drafts)
        .bind(filter.country_id)
        .bind(filter.category_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *conn)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tours t {}", LIST_FILTER))
            .bind(filter.include_drafts)
            .bind(filter.country_id)
            .bind(filter.category_id)
            .fetch_one(&mut *conn)
            .await?;

        let tours = attach_links(&mut conn, rows).await?;
        Ok((tours, total))
    }

    async fn create_inner(
        &self,
        draft: TourDraft,
        writes: AssociationWrites,
    ) -> Result<Option<TourDetails>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tours (title, description, short_description, price, price_type,
                               duration_days, is_draft, is_active, services, itinerary,
                               images, map_points)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(draft.title.to_value())
        .bind(draft.description.to_value())
        .bind(draft.short_description.as_ref().map(|s| s.to_value()))
        .bind(draft.price)
        .bind(draft.price_type.as_str())
        .bind(draft.duration_days)
        .bind(draft.is_draft)
        .bind(!draft.is_draft)
        .bind(Value::Array(draft.services))
        .bind(Value::Array(draft.itinerary))
        .bind(Value::Array(draft.images))
        .bind(json_array(&draft.map_points))
        .fetch_one(&mut *tx)
        .await?;

        apply_link_writes(&mut tx, id, &writes).await?;
        let details = fetch_details(&mut tx, id).await?;

        tx.commit().await?;
        Ok(details)
    }

    async fn update_inner(
        &self,
        id: i64,
        changes: TourChanges,
        writes: AssociationWrites,
    ) -> Result<Option<TourDetails>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if !lock_tour(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE tours SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                short_description = COALESCE($4, short_description),
                price = COALESCE($5, price),
                price_type = COALESCE($6, price_type),
                duration_days = COALESCE($7, duration_days),
                services = COALESCE($8, services),
                itinerary = COALESCE($9, itinerary),
                images = COALESCE($10, images),
                map_points = COALESCE($11, map_points),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title.as_ref().map(|t| t.to_value()))
        .bind(changes.description.as_ref().map(|t| t.to_value()))
        .bind(changes.short_description.as_ref().map(|t| t.to_value()))
        .bind(changes.price)
        .bind(changes.price_type.map(|p| p.as_str()))
        .bind(changes.duration_days)
        .bind(changes.services.map(Value::Array))
        .bind(changes.itinerary.map(Value::Array))
        .bind(changes.images.map(Value::Array))
        .bind(changes.map_points.as_deref().map(json_array))
        .execute(&mut *tx)
        .await?;

        apply_link_writes(&mut tx, id, &writes).await?;
        let details = fetch_details(&mut tx, id).await?;

        tx.commit().await?;
        Ok(details)
    }

    async fn publish_inner(
        &self,
        id: i64,
    ) -> Result<Option<Result<TourDetails, PublishError>>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if !lock_tour(&mut tx, id).await? {
            return Ok(None);
        }
        let Some(details) = fetch_details(&mut tx, id).await? else {
            return Ok(None);
        };
        if let Err(rejected) = check_publishable(&details) {
            tx.rollback().await?;
            return Ok(Some(Err(rejected)));
        }

        sqlx::query(
            "UPDATE tours SET is_draft = FALSE, is_active = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let published = fetch_details(&mut tx, id).await?;
        tx.commit().await?;
        Ok(published.map(Ok))
    }
}

fn tour_not_found() -> StoreError {
    StoreError::NotFound("Tour".to_string())
}

#[async_trait]
impl TourStore for TourRepository {
    async fn list_tours(&self, filter: &TourListFilter) -> StoreResult<(Vec<TourDetails>, i64)> {
        let timer = QueryTimer::new("list_tours");
        let result = with_db_retry(&self.retry, "list_tours", || self.list_inner(filter)).await;
        timer.finish(&result);
        result
    }

    async fn find_tour(&self, id: i64) -> StoreResult<Option<TourDetails>> {
        let timer = QueryTimer::new("find_tour");
        let pool = &self.pool;
        let result = with_db_retry(&self.retry, "find_tour", || async move {
            let mut conn = pool.acquire().await?;
            fetch_details(&mut conn, id).await
        })
        .await;
        timer.finish(&result);
        result
    }

    async fn create_tour(
        &self,
        draft: TourDraft,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails> {
        let timer = QueryTimer::new("create_tour");
        let result = self.create_inner(draft, links).await.map_err(store_error);
        timer.finish(&result);
        result?.ok_or_else(tour_not_found)
    }

    async fn update_tour(
        &self,
        id: i64,
        changes: TourChanges,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails> {
        let timer = QueryTimer::new("update_tour");
        let result = self
            .update_inner(id, changes, links)
            .await
            .map_err(store_error);
        timer.finish(&result);
        result?.ok_or_else(tour_not_found)
    }

    async fn publish_tour(&self, id: i64) -> StoreResult<Result<TourDetails, PublishError>> {
        let timer = QueryTimer::new("publish_tour");
        let result = self.publish_inner(id).await.map_err(store_error);
        timer.finish(&result);
        result?.ok_or_else(tour_not_found)
    }

    async fn delete_tour(&self, id: i64) -> StoreResult<bool> {
        let timer = QueryTimer::new("delete_tour");
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) => Err(match store_error(e) {
                StoreError::InvalidReference(_) => {
                    StoreError::Conflict("Tour has booking requests".to_string())
                }
                other => other,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::tour::MapPoint;

    #[test]
    fn test_json_array_serializes_points() {
        let points = vec![MapPoint {
            lat: 38.5,
            lng: 68.7,
            title: None,
            day: Some(1),
        }];
        assert_eq!(
            json_array(&points),
            serde_json::json!([{"lat": 38.5, "lng": 68.7, "day": 1}])
        );
    }

    #[test]
    fn test_list_filter_binds_in_order() {
        assert!(LIST_FILTER.contains("$1 OR t.is_draft = FALSE"));
        assert!(LIST_FILTER.contains("tc.country_id = $2"));
        assert!(LIST_FILTER.contains("tca.category_id = $3"));
    }
}
