//! Catalog store metrics: per-query latency by outcome and pool gauges.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Records one store query. `outcome` is `ok` or `error`.
pub fn record_query(query: &str, outcome: &'static str, duration_secs: f64) {
    histogram!(
        "catalog_query_duration_seconds",
        "query" => query.to_string(),
        "outcome" => outcome
    )
    .record(duration_secs);

    if outcome == "error" {
        counter!("catalog_query_errors_total", "query" => query.to_string()).increment(1);
    }
}

/// Samples the Postgres pool. Called on every scrape of `/metrics`.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("catalog_db_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("catalog_db_connections_idle").set(idle as f64);
    gauge!("catalog_db_connections_total").set(size as f64);
}

/// Times one repository call, labelled by query name.
///
/// ```ignore
/// let timer = QueryTimer::new("find_tour");
/// let row = with_db_retry(&retry, "find_tour", || ...).await;
/// timer.finish(&row);
/// ```
pub struct QueryTimer {
    query: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            start: Instant::now(),
        }
    }

    /// Records the elapsed time with the outcome taken from `result`.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        record_query(
            &self.query,
            outcome(result),
            self.start.elapsed().as_secs_f64(),
        );
    }
}

fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}
