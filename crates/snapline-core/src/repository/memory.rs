use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{SnapshotRepository, SnapshotSummary};
use crate::errors::{ExResult, SnapshotError};
use crate::model::{Snapshot, SnapshotStatus};

/// In-process repository
///
/// Every operation runs under one mutex, so the version check, the
/// single-active check and the write form one atomic unit.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Snapshot>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotRepository for MemoryRepository {
    fn load(&self, snapshot_id: &str) -> ExResult<Snapshot> {
        self.guard().get(snapshot_id).cloned().ok_or_else(|| {
            SnapshotError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            }
            .into()
        })
    }

    fn save(&self, snapshot: &Snapshot) -> ExResult<u64> {
        let mut snapshots = self.guard();

        let stored_version = snapshots.get(snapshot.id()).map_or(0, Snapshot::version);
        if stored_version != snapshot.version() {
            return Err(SnapshotError::ConcurrentModification {
                snapshot_id: snapshot.id().to_string(),
                expected_version: snapshot.version(),
                actual_version: stored_version,
            }
            .into());
        }

        if snapshot.status() == SnapshotStatus::Active {
            let other_active = snapshots.values().find(|s| {
                s.program_id() == snapshot.program_id()
                    && s.status() == SnapshotStatus::Active
                    && s.id() != snapshot.id()
            });
            if let Some(other) = other_active {
                return Err(SnapshotError::AnotherSnapshotActive {
                    program_id: snapshot.program_id().to_string(),
                    active_snapshot_id: other.id().to_string(),
                }
                .into());
            }
        }

        let version = stored_version + 1;
        let mut stored = snapshot.clone();
        stored.mark_persisted(version);
        snapshots.insert(stored.id().to_string(), stored);
        Ok(version)
    }

    fn find_active_for_program(&self, program_id: &str) -> ExResult<Option<Snapshot>> {
        Ok(self
            .guard()
            .values()
            .find(|s| s.program_id() == program_id && s.status() == SnapshotStatus::Active)
            .cloned())
    }

    fn count_active_for_program(&self, program_id: &str) -> ExResult<usize> {
        Ok(self
            .guard()
            .values()
            .filter(|s| s.program_id() == program_id && s.status() == SnapshotStatus::Active)
            .count())
    }

    fn list_for_program(&self, program_id: &str) -> ExResult<Vec<SnapshotSummary>> {
        let snapshots = self.guard();
        let mut rows: Vec<&Snapshot> = snapshots
            .values()
            .filter(|s| s.program_id() == program_id)
            .collect();
        rows.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.id().cmp(b.id())));
        Ok(rows.into_iter().map(SnapshotSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_save_then_load_bumps_version() {
        let repo = MemoryRepository::new();
        let snapshot = Snapshot::create("p");

        assert_eq!(repo.save(&snapshot).unwrap(), 1);
        let loaded = repo.load(snapshot.id()).unwrap();
        assert_eq!(loaded.version(), 1);
        assert_eq!(repo.save(&loaded).unwrap(), 2);
    }

    #[test]
    fn test_stale_save_is_concurrent_modification() {
        let repo = MemoryRepository::new();
        let snapshot = Snapshot::create("p");
        repo.save(&snapshot).unwrap();

        let first = repo.load(snapshot.id()).unwrap();
        let second = repo.load(snapshot.id()).unwrap();
        repo.save(&first).unwrap();

        let err = repo.save(&second).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ConcurrentModification);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.load("nope").unwrap_err().kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_second_active_snapshot_rejected_at_save() {
        let repo = MemoryRepository::new();
        let mut a = Snapshot::create("p");
        let mut b = Snapshot::create("p");
        a.status = SnapshotStatus::Active;
        b.status = SnapshotStatus::Active;

        repo.save(&a).unwrap();
        let err = repo.save(&b).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AnotherSnapshotActive);
        assert_eq!(repo.count_active_for_program("p").unwrap(), 1);
        assert_eq!(
            repo.find_active_for_program("p").unwrap().map(|s| s.id().to_string()),
            Some(a.id().to_string())
        );
    }

    #[test]
    fn test_list_for_program_filters_by_program() {
        let repo = MemoryRepository::new();
        repo.save(&Snapshot::create("p")).unwrap();
        repo.save(&Snapshot::create("p")).unwrap();
        repo.save(&Snapshot::create("q")).unwrap();

        let rows = repo.list_for_program("p").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.program_id == "p" && r.version == 1));
    }
}
