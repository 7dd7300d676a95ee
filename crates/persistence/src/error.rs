//! Mapping of `sqlx` errors into the domain storage taxonomy, and the retry
//! wrapper for repository reads.

use domain::store::StoreError;
use shared::retry::{with_retry_if, RetryPolicy};
use std::future::Future;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE codes worth retrying: connection exceptions (class 08),
/// serialization failures, deadlocks and server shutdown/overload.
fn is_transient_code(code: &str) -> bool {
    code.starts_with("08")
        || matches!(code, "40001" | "40P01" | "53300" | "57P01" | "57P02" | "57P03")
}

/// Whether a failed query may succeed if simply run again.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().as_deref().map_or(false, is_transient_code),
        _ => false,
    }
}

/// Converts a `sqlx` error into a [`StoreError`].
pub fn store_error(err: sqlx::Error) -> StoreError {
    if is_transient(&err) {
        return StoreError::Unavailable(err.to_string());
    }
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Record".to_string()),
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::Conflict(db.message().to_string()),
            Some(FOREIGN_KEY_VIOLATION) => {
                StoreError::InvalidReference(db.message().to_string())
            }
            Some(CHECK_VIOLATION) => StoreError::Backend(db.message().to_string()),
            _ => StoreError::Backend(db.to_string()),
        },
        other => StoreError::Backend(other.to_string()),
    }
}

/// Runs a read query under the retry policy, retrying transient failures.
pub async fn with_db_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    with_retry_if(policy, operation_name, operation, is_transient)
        .await
        .map_err(store_error)
}
