//! Shared utilities for the Tajik Trails backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Shared-secret comparison
//! - Offset pagination helpers
//! - Retry with linear backoff
//! - Common validation logic

pub mod crypto;
pub mod pagination;
pub mod retry;
pub mod validation;
