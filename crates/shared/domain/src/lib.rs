//! # Domain Models
//!
//! Pure types shared by every crate of the ingest API: configuration, wire models,
//! table/schema constants and the feature-slice registry.
//! Keep it lean: no I/O, networking, or query logic here.

pub mod config;
pub mod constants;
pub mod models;
pub mod registry;
