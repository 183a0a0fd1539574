use chrono::Utc;

use crate::digest;
use crate::errors::{Result, SnapshotError};
use crate::model::{Snapshot, SnapshotStatus, Transition};
use crate::rules::validation;

/// Activate a DRAFT snapshot
///
/// `competing_active` is the id of the program's currently ACTIVE snapshot
/// as observed by the caller under the program-scoped lock. The aggregate
/// cannot see other aggregates, so the caller supplies this fact.
///
/// On success the status flips to ACTIVE, the structure digest and
/// activation time are recorded, and the structure is frozen.
///
/// # Errors
/// * `IllegalStateTransition` - Snapshot is not DRAFT
/// * `AnotherSnapshotActive` - A different snapshot of the program is ACTIVE
/// * Any error from [`validation::validate_for_activation`]
pub fn activate(snapshot: &mut Snapshot, competing_active: Option<&str>) -> Result<()> {
    let next = next_status(snapshot, Transition::Activate)?;

    if let Some(active_snapshot_id) = competing_active.filter(|id| *id != snapshot.id()) {
        return Err(SnapshotError::AnotherSnapshotActive {
            program_id: snapshot.program_id().to_string(),
            active_snapshot_id: active_snapshot_id.to_string(),
        });
    }

    validation::validate_for_activation(snapshot)?;
    let structure_digest = digest::compute_structure_digest(snapshot)?;

    let now = Utc::now();
    snapshot.status = next;
    snapshot.structure_digest = Some(structure_digest);
    snapshot.activated_at = Some(now);
    snapshot.updated_at = now;

    tracing::debug!(
        snapshot_id = %snapshot.id(),
        program_id = %snapshot.program_id(),
        items = snapshot.item_count(),
        "snapshot activated"
    );
    Ok(())
}

/// Mark an ACTIVE snapshot's teaching period as ended
///
/// # Errors
/// * `IllegalStateTransition` - Snapshot is not ACTIVE
pub fn complete(snapshot: &mut Snapshot) -> Result<()> {
    flip(snapshot, Transition::Complete)
}

/// Soft-delete a snapshot; terminal
///
/// # Errors
/// * `IllegalStateTransition` - Snapshot is already ARCHIVED
pub fn archive(snapshot: &mut Snapshot) -> Result<()> {
    flip(snapshot, Transition::Archive)
}

fn flip(snapshot: &mut Snapshot, transition: Transition) -> Result<()> {
    let next = next_status(snapshot, transition)?;
    tracing::debug!(
        snapshot_id = %snapshot.id(),
        from = %snapshot.status(),
        to = %next,
        "status changed"
    );
    snapshot.status = next;
    snapshot.touch();
    Ok(())
}

fn next_status(snapshot: &Snapshot, transition: Transition) -> Result<SnapshotStatus> {
    snapshot
        .status()
        .next(transition)
        .ok_or_else(|| SnapshotError::IllegalStateTransition {
            snapshot_id: snapshot.id().to_string(),
            status: snapshot.status(),
            transition,
        })
}
