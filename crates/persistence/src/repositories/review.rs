//! Review repository for database operations.

use async_trait::async_trait;
use domain::models::review::{NewReview, Review, ReviewFilter};
use domain::store::{ReviewStore, StoreError, StoreResult};
use shared::retry::RetryPolicy;
use sqlx::PgPool;

use crate::entities::{ReviewEntity, REVIEW_COLUMNS};
use crate::error::{store_error, with_db_retry};
use crate::metrics::QueryTimer;

/// Repository for review database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl ReviewRepository {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    async fn moderate_inner(
        &self,
        id: i64,
        is_moderated: bool,
    ) -> Result<Option<ReviewEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, ReviewEntity>(&format!(
            "UPDATE reviews SET is_moderated = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(is_moderated)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(review) = review else {
            return Ok(None);
        };

        // Rating is the one-decimal average over moderated reviews.
        sqlx::query(
            r#"
            UPDATE tours SET
                rating = COALESCE((
                    SELECT ROUND(AVG(rating)::NUMERIC, 1)::DOUBLE PRECISION
                    FROM reviews WHERE tour_id = $1 AND is_moderated = TRUE
                ), 0),
                reviews_count = (
                    SELECT COUNT(*)::INTEGER FROM reviews WHERE tour_id = $1 AND is_moderated = TRUE
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(review.tour_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(review))
    }
}

#[async_trait]
impl ReviewStore for ReviewRepository {
    async fn create_review(&self, new: NewReview) -> StoreResult<Review> {
        let timer = QueryTimer::new("create_review");
        let row = sqlx::query_as::<_, ReviewEntity>(&format!(
            r#"
            INSERT INTO reviews (tour_id, author_name, rating, text, is_moderated)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        ))
        .bind(new.tour_id)
        .bind(&new.author_name)
        .bind(new.rating)
        .bind(&new.text)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        Ok(row?.into())
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> StoreResult<Vec<Review>> {
        let timer = QueryTimer::new("list_reviews");
        let sql = format!(
            r#"
            SELECT {} FROM reviews
            WHERE ($1::BIGINT IS NULL OR tour_id = $1)
              AND ($2::BOOLEAN IS NULL OR is_moderated = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            REVIEW_COLUMNS
        );
        let rows = with_db_retry(&self.retry, "list_reviews", || {
            sqlx::query_as::<_, ReviewEntity>(&sql)
                .bind(filter.tour_id)
                .bind(filter.moderated)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
        })
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    async fn set_review_moderation(&self, id: i64, is_moderated: bool) -> StoreResult<Review> {
        let timer = QueryTimer::new("set_review_moderation");
        let result = self
            .moderate_inner(id, is_moderated)
            .await
            .map_err(store_error);
        timer.finish(&result);

        result?
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound("Review".to_string()))
    }
}
