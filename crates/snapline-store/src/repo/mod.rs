//! Repository layer persisting snapshot aggregates to SQLite

pub mod hydration;
pub mod sqlite_repo;

pub use sqlite_repo::{SqliteSnapshotRepository, TransitionRecord};
