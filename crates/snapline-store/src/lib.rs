//! Snapline Store - SQLite persistence for curriculum snapshots
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteSnapshotRepository`, the relational implementation of the
//!   Repository Port
//! - Hydration of aggregates from rows, with full structural re-validation
//! - YAML seed import

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod seed;

// Re-export key types
pub use errors::Result;
pub use repo::{SqliteSnapshotRepository, TransitionRecord};
