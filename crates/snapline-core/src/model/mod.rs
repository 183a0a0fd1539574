pub mod item;
pub mod relation;
pub mod snapshot;
pub mod status;

pub use item::{ItemKind, SnapshotItem};
pub use relation::SnapshotRelation;
pub use snapshot::{Snapshot, SnapshotParts};
pub use status::{SnapshotStatus, Transition};
