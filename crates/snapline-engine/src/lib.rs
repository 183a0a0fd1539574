//! Snapline Engine - Orchestration layer
//!
//! Hosts the Snapshot Lifecycle Controller, which sequences every mutation
//! and lifecycle transition through the Repository Port under a lock
//! discipline:
//!
//! - per-snapshot lock around each load-apply-save cycle
//! - program lock, taken before the snapshot lock, around activation so the
//!   "is another snapshot ACTIVE" check and the status flip are one unit
//! - bounded waits surfacing as retryable `LockTimeout`
//!
//! The storage-level unique constraint remains the final backstop for
//! writers outside this process.

pub mod commands;
pub mod config;
pub mod controller;
pub mod locks;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use config::EngineConfig;
pub use controller::SnapshotLifecycleController;
pub use locks::{LockGuard, LockTable};
