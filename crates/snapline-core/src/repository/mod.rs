//! Repository Port
//!
//! Persistence contract for snapshot aggregates. Implementations must save
//! an aggregate as one unit (items, relations, status) or not at all, and
//! must enforce "at most one ACTIVE snapshot per program" atomically at the
//! storage level as the final backstop behind the controller's locks.

mod memory;

pub use memory::MemoryRepository;

use crate::errors::ExResult;
use crate::model::{Snapshot, SnapshotStatus};

/// Lightweight listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub id: String,
    pub program_id: String,
    pub status: SnapshotStatus,
    pub version: u64,
    pub item_count: usize,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id().to_string(),
            program_id: snapshot.program_id().to_string(),
            status: snapshot.status(),
            version: snapshot.version(),
            item_count: snapshot.item_count(),
        }
    }
}

/// Persistence port for snapshot aggregates
#[allow(clippy::result_large_err)]
pub trait SnapshotRepository: Send + Sync {
    /// Load a snapshot by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such snapshot exists.
    fn load(&self, snapshot_id: &str) -> ExResult<Snapshot>;

    /// Persist the whole aggregate atomically, returning the new version.
    ///
    /// A snapshot with version 0 is inserted; otherwise the stored version
    /// must equal `snapshot.version()`.
    ///
    /// # Errors
    ///
    /// * `ConcurrentModification` - the stored version advanced since load
    /// * `AnotherSnapshotActive` - saving would leave two ACTIVE snapshots
    ///   for the program
    fn save(&self, snapshot: &Snapshot) -> ExResult<u64>;

    /// The program's ACTIVE snapshot, if any.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn find_active_for_program(&self, program_id: &str) -> ExResult<Option<Snapshot>>;

    /// Number of ACTIVE snapshots for the program (0 or 1 when the
    /// invariant holds).
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn count_active_for_program(&self, program_id: &str) -> ExResult<usize>;

    /// All snapshots of a program, oldest first.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn list_for_program(&self, program_id: &str) -> ExResult<Vec<SnapshotSummary>>;
}
