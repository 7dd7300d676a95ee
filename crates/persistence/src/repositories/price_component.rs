//! Price calculator component repository.

use async_trait::async_trait;
use domain::models::price_component::{NewPriceComponent, PriceComponent};
use domain::store::{PriceComponentStore, StoreResult};
use shared::retry::RetryPolicy;
use sqlx::PgPool;

use crate::entities::{PriceComponentEntity, PRICE_COMPONENT_COLUMNS};
use crate::error::{store_error, with_db_retry};
use crate::metrics::QueryTimer;

/// Repository for price component database operations.
#[derive(Clone)]
pub struct PriceComponentRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PriceComponentRepository {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl PriceComponentStore for PriceComponentRepository {
    async fn list_price_components(&self) -> StoreResult<Vec<PriceComponent>> {
        let timer = QueryTimer::new("list_price_components");
        let sql = format!(
            "SELECT {} FROM price_calculator_components ORDER BY sort_order, key",
            PRICE_COMPONENT_COLUMNS
        );
        let rows = with_db_retry(&self.retry, "list_price_components", || {
            sqlx::query_as::<_, PriceComponentEntity>(&sql).fetch_all(&self.pool)
        })
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    async fn upsert_price_component(&self, new: NewPriceComponent) -> StoreResult<PriceComponent> {
        let timer = QueryTimer::new("upsert_price_component");
        let row = sqlx::query_as::<_, PriceComponentEntity>(&format!(
            r#"
            INSERT INTO price_calculator_components (key, name, price, unit, category, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                unit = EXCLUDED.unit,
                category = EXCLUDED.category,
                sort_order = EXCLUDED.sort_order,
                updated_at = NOW()
            RETURNING {}
            "#,
            PRICE_COMPONENT_COLUMNS
        ))
        .bind(&new.key)
        .bind(new.name.to_value())
        .bind(new.price)
        .bind(&new.unit)
        .bind(&new.category)
        .bind(new.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        Ok(row?.into())
    }

    async fn delete_price_component(&self, key: &str) -> StoreResult<bool> {
        let timer = QueryTimer::new("delete_price_component");
        let result = sqlx::query("DELETE FROM price_calculator_components WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(store_error);
        timer.finish(&result);

        Ok(result?.rows_affected() > 0)
    }
}
