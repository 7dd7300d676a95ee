//! Domain layer for the Tajik Trails catalog backend.
//!
//! This crate contains:
//! - Domain models (tours, reference entities, bookings, reviews, price components)
//! - Multilingual field handling and response shaping
//! - Storage traits implemented by the persistence crate

pub mod models;
pub mod services;
pub mod store;
