use crate::errors::{Result, SnapshotError};
use crate::model::Snapshot;

/// Add a "comes before" relation between two leaves of a DRAFT snapshot
///
/// Adding an edge that already exists is a no-op.
///
/// # Returns
/// `true` if the edge was inserted, `false` if it was already present
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `ItemNotFound` - Either endpoint doesn't exist
/// * `RelationEndpointNotLeaf` - Either endpoint is a container
/// * `SelfLoop` / `CycleDetected` / `DuplicatePredecessor` - from the relation graph
pub fn add_relation(snapshot: &mut Snapshot, from_item_id: &str, to_item_id: &str) -> Result<bool> {
    snapshot.ensure_mutable()?;
    require_leaf(snapshot, from_item_id)?;
    require_leaf(snapshot, to_item_id)?;

    let inserted = snapshot.relations.add_edge(from_item_id, to_item_id)?;
    if inserted {
        tracing::debug!(
            snapshot_id = %snapshot.id(),
            from_item_id,
            to_item_id,
            "relation added"
        );
        snapshot.touch();
    }
    Ok(inserted)
}

/// Remove a relation; removing a missing edge is a no-op
///
/// # Returns
/// Whether the edge existed
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
pub fn remove_relation(
    snapshot: &mut Snapshot,
    from_item_id: &str,
    to_item_id: &str,
) -> Result<bool> {
    snapshot.ensure_mutable()?;
    let removed = snapshot.relations.remove_edge(from_item_id, to_item_id);
    if removed {
        snapshot.touch();
    }
    Ok(removed)
}

/// Designate the entry point for traversal and reachability validation
///
/// # Errors
/// * `ImmutableSnapshot` - Snapshot is not DRAFT
/// * `ItemNotFound` - Item doesn't exist
/// * `InvalidStartItem` - Item is a container or already has an incoming relation
pub fn set_start_item(snapshot: &mut Snapshot, item_id: &str) -> Result<()> {
    snapshot.ensure_mutable()?;
    let item = snapshot.get_item(item_id)?;
    if !item.is_leaf() {
        return Err(SnapshotError::InvalidStartItem {
            item_id: item_id.to_string(),
            reason: "start item must be a leaf".to_string(),
        });
    }
    if let Some(predecessor) = snapshot.relations.predecessor_of(item_id) {
        return Err(SnapshotError::InvalidStartItem {
            item_id: item_id.to_string(),
            reason: format!("item already follows {}", predecessor),
        });
    }

    snapshot.start_item_id = Some(item_id.to_string());
    snapshot.touch();
    Ok(())
}

fn require_leaf(snapshot: &Snapshot, item_id: &str) -> Result<()> {
    if snapshot.get_item(item_id)?.is_leaf() {
        Ok(())
    } else {
        Err(SnapshotError::RelationEndpointNotLeaf {
            item_id: item_id.to_string(),
        })
    }
}
