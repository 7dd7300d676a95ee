//! Offset pagination helpers for list endpoints.

/// Resolves a requested page size against a default and an upper bound.
///
/// Missing or non-positive values fall back to `default`; oversized values
/// are clamped to `max`.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    match requested {
        Some(limit) if limit > 0 => limit.min(max),
        _ => default.min(max),
    }
}

/// Negative offsets are treated as zero.
pub fn normalize_offset(requested: Option<i64>) -> i64 {
    requested.unwrap_or(0).max(0)
}
