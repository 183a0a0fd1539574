//! Snapline Core - curriculum snapshot domain kernel
//!
//! This crate provides the data structures and operations for versioned
//! curriculum snapshots:
//! - Snapshot aggregate with a bounded-depth item tree and a leaf relation layer
//! - Hierarchy validation and relation-graph algorithms (cycle, reachability)
//! - Lifecycle state machine (draft, active, completed, archived)
//! - Functional `apply()` boundary over a closed command set
//! - Repository and event ports consumed by the lifecycle controller
//! - Traversal, structure digest and Markdown outline rendering

pub mod apply;
pub mod commands;
pub mod digest;
pub mod errors;
pub mod events;
pub mod graph;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod render;
pub mod repository;
pub mod rules;
pub mod traversal;

/// Re-exported for the logging macros
pub use snapline_core_types as core_types;

// Re-export commonly used types
pub use apply::apply;
pub use commands::Command;
pub use errors::{ErrorCategory, ExError, ExErrorKind, ExResult, Result, SnapshotError};
pub use events::{InMemoryEventSink, NoopEventSink, SnapshotEvent, SnapshotEventSink};
pub use graph::RelationGraph;
pub use model::{ItemKind, Snapshot, SnapshotItem, SnapshotParts, SnapshotRelation, SnapshotStatus, Transition};
pub use ops::RemovalMode;
pub use policy::{ActivationPolicyHook, DenyAllActivationPolicyHook, NoopActivationPolicyHook};
pub use repository::{MemoryRepository, SnapshotRepository, SnapshotSummary};
