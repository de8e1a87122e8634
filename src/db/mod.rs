//! SQLite persistence for the ledger.
//!
//! This module provides:
//! - Database initialization, pragmas and the embedded schema
//! - The `Repository` keyed load/save layer for every entity kind

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{EntityCounts, Repository};
