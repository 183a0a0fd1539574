use crate::errors::{Result, SnapshotError};
use crate::model::Snapshot;

use super::hierarchy::MAX_DEPTH;
use super::invariants;

/// Validate the item tree and relation layer of a snapshot
///
/// Checks that hold in every lifecycle state:
///
/// 1. Every parent reference resolves and points at a container
/// 2. Depth equals parent depth + 1 and never exceeds the maximum
/// 3. Only leaves carry learning-object references
/// 4. Every relation endpoint exists and is a leaf
/// 5. A designated start item, if any, exists and is a leaf
///
/// # Errors
///
/// Returns the first violation encountered. For exhaustive reporting, call
/// the individual functions in [`invariants`] directly.
pub fn validate_structure(snapshot: &Snapshot) -> Result<()> {
    if let Some((_, parent_id)) = invariants::find_orphans(snapshot).into_iter().next() {
        return Err(SnapshotError::ItemNotFound { item_id: parent_id });
    }

    if let Some((_, parent_id)) = invariants::find_leaf_parents(snapshot).into_iter().next() {
        return Err(SnapshotError::InvalidParentKind { parent_id });
    }

    if let Some((item_id, expected, recorded)) =
        invariants::find_depth_violations(snapshot).into_iter().next()
    {
        if recorded > MAX_DEPTH {
            let item = snapshot.get_item(&item_id)?;
            return Err(SnapshotError::DepthExceeded {
                parent_id: item.parent_id.clone().unwrap_or_else(|| "<root>".to_string()),
                depth: recorded,
                max_depth: MAX_DEPTH,
            });
        }
        return Err(SnapshotError::Internal {
            message: format!(
                "item {} records depth {} but its parent chain implies {}",
                item_id, recorded, expected
            ),
        });
    }

    if let Some(item_id) = invariants::find_learning_objects_on_containers(snapshot)
        .into_iter()
        .next()
    {
        return Err(SnapshotError::LearningObjectOnContainer { item_id });
    }

    if let Some((from_item_id, to_item_id)) =
        invariants::find_dangling_relations(snapshot).into_iter().next()
    {
        return Err(SnapshotError::DanglingRelation {
            from_item_id,
            to_item_id,
        });
    }

    if let Some(item_id) = invariants::find_non_leaf_endpoints(snapshot).into_iter().next() {
        return Err(SnapshotError::RelationEndpointNotLeaf { item_id });
    }

    if let Some(start_item_id) = snapshot.start_item_id() {
        let start = snapshot.get_item(start_item_id)?;
        if !start.is_leaf() {
            return Err(SnapshotError::InvalidStartItem {
                item_id: start_item_id.to_string(),
                reason: "start item must be a leaf".to_string(),
            });
        }
    }

    Ok(())
}

/// Full-graph validation run before a snapshot leaves DRAFT
///
/// On top of [`validate_structure`]:
///
/// 1. The relation layer is acyclic (re-checked from scratch, independent of
///    the incremental checks done when edges were added)
/// 2. A start item is designated and has no incoming relation
/// 3. Every leaf is reachable from the start item
///
/// # Errors
///
/// `CycleDetected`, `StartItemMissing`, `InvalidStartItem` or
/// `UnreachableItems` (listing every unreachable leaf), or any error from
/// [`validate_structure`].
pub fn validate_for_activation(snapshot: &Snapshot) -> Result<()> {
    validate_structure(snapshot)?;

    if let Some((from_item_id, to_item_id)) = snapshot.relation_graph().find_cycle() {
        return Err(SnapshotError::CycleDetected {
            from_item_id,
            to_item_id,
        });
    }

    let start_item_id = snapshot
        .start_item_id()
        .ok_or_else(|| SnapshotError::StartItemMissing {
            snapshot_id: snapshot.id().to_string(),
        })?;

    if let Some(predecessor) = snapshot.relation_graph().predecessor_of(start_item_id) {
        return Err(SnapshotError::InvalidStartItem {
            item_id: start_item_id.to_string(),
            reason: format!("start item has an incoming relation from {}", predecessor),
        });
    }

    let unreachable = invariants::find_unreachable_leaves(snapshot, start_item_id);
    if !unreachable.is_empty() {
        return Err(SnapshotError::UnreachableItems {
            start_item_id: start_item_id.to_string(),
            item_ids: unreachable,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKind, SnapshotItem};

    fn leaf(id: &str) -> SnapshotItem {
        SnapshotItem::new(id.to_string(), id.to_string(), ItemKind::Leaf)
    }

    fn snapshot_with(items: Vec<SnapshotItem>, edges: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::new("s".to_string(), "p".to_string());
        for item in items {
            snapshot.items.insert(item.id.clone(), item);
        }
        for (from, to) in edges {
            snapshot.relations.insert_unchecked(from, to);
        }
        snapshot
    }

    #[test]
    fn test_single_leaf_without_relations_is_activatable() {
        let mut snapshot = snapshot_with(vec![leaf("a")], &[]);
        snapshot.start_item_id = Some("a".to_string());
        assert!(validate_for_activation(&snapshot).is_ok());
    }

    #[test]
    fn test_missing_start_item_rejected() {
        let snapshot = snapshot_with(vec![leaf("a")], &[]);
        assert!(matches!(
            validate_for_activation(&snapshot),
            Err(SnapshotError::StartItemMissing { .. })
        ));
    }

    #[test]
    fn test_start_item_with_incoming_edge_rejected() {
        let mut snapshot = snapshot_with(vec![leaf("a"), leaf("b")], &[("a", "b")]);
        snapshot.start_item_id = Some("b".to_string());
        assert!(matches!(
            validate_for_activation(&snapshot),
            Err(SnapshotError::InvalidStartItem { .. })
        ));
    }

    #[test]
    fn test_disconnected_chains_rejected_at_activation() {
        let mut snapshot = snapshot_with(
            vec![leaf("a"), leaf("b"), leaf("c"), leaf("d")],
            &[("a", "b"), ("c", "d")],
        );
        snapshot.start_item_id = Some("a".to_string());

        // Valid while drafting
        assert!(validate_structure(&snapshot).is_ok());

        assert_eq!(
            validate_for_activation(&snapshot),
            Err(SnapshotError::UnreachableItems {
                start_item_id: "a".to_string(),
                item_ids: vec!["c".to_string(), "d".to_string()],
            })
        );
    }

    #[test]
    fn test_cycle_rechecked_from_scratch() {
        let mut snapshot = snapshot_with(vec![leaf("a"), leaf("b")], &[("a", "b"), ("b", "a")]);
        snapshot.start_item_id = Some("a".to_string());
        assert!(matches!(
            validate_for_activation(&snapshot),
            Err(SnapshotError::CycleDetected { .. })
        ));
    }
}
