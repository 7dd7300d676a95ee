//! Persistence layer for the Tajik Trails backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Postgres repositories implementing the domain store traits
//! - An in-memory store with the same behavior

pub mod db;
pub mod entities;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod repositories;
pub mod stores;

pub use stores::Stores;
