use super::hierarchy::MAX_DEPTH;
use crate::model::Snapshot;

/// Find items whose `parent_id` does not resolve inside the snapshot
///
/// Returns list of (child_id, parent_id) tuples
pub fn find_orphans(snapshot: &Snapshot) -> Vec<(String, String)> {
    snapshot
        .items()
        .filter_map(|item| {
            let parent_id = item.parent_id.as_ref()?;
            (!snapshot.contains_item(parent_id)).then(|| (item.id.clone(), parent_id.clone()))
        })
        .collect()
}

/// Find items parented by a leaf
///
/// Returns list of (child_id, parent_id) tuples
pub fn find_leaf_parents(snapshot: &Snapshot) -> Vec<(String, String)> {
    snapshot
        .items()
        .filter_map(|item| {
            let parent = snapshot.get_item(item.parent_id.as_deref()?).ok()?;
            parent
                .is_leaf()
                .then(|| (item.id.clone(), parent.id.clone()))
        })
        .collect()
}

/// Find items whose recorded depth disagrees with their parent chain or
/// exceeds the maximum
///
/// A parent cycle always shows up here, since depth must strictly increase
/// along every parent link.
///
/// Returns list of (item_id, expected_depth, recorded_depth) tuples
pub fn find_depth_violations(snapshot: &Snapshot) -> Vec<(String, u8, u8)> {
    let mut violations = Vec::new();

    for item in snapshot.items() {
        let expected = match item.parent_id.as_deref() {
            None => 0,
            Some(parent_id) => match snapshot.get_item(parent_id) {
                Ok(parent) => parent.depth.saturating_add(1),
                // Reported by find_orphans
                Err(_) => continue,
            },
        };
        if item.depth != expected || item.depth > MAX_DEPTH {
            violations.push((item.id.clone(), expected, item.depth));
        }
    }

    violations
}

/// Find containers that carry a learning-object reference
pub fn find_learning_objects_on_containers(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .items()
        .filter(|item| item.is_container() && item.learning_object_ref.is_some())
        .map(|item| item.id.clone())
        .collect()
}

/// Find relation edges with an endpoint missing from the snapshot
///
/// Returns list of (from_item_id, to_item_id) tuples
pub fn find_dangling_relations(snapshot: &Snapshot) -> Vec<(String, String)> {
    snapshot
        .relations()
        .into_iter()
        .filter(|edge| {
            !snapshot.contains_item(&edge.from_item_id) || !snapshot.contains_item(&edge.to_item_id)
        })
        .map(|edge| (edge.from_item_id, edge.to_item_id))
        .collect()
}

/// Find relation endpoints that exist but are containers
pub fn find_non_leaf_endpoints(snapshot: &Snapshot) -> Vec<String> {
    let mut ids: Vec<String> = snapshot
        .relations()
        .into_iter()
        .flat_map(|edge| [edge.from_item_id, edge.to_item_id])
        .filter(|id| snapshot.get_item(id).is_ok_and(|item| item.is_container()))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Find leaves not reachable from `start_item_id` along relation edges
///
/// Result is ordered by item id.
pub fn find_unreachable_leaves(snapshot: &Snapshot, start_item_id: &str) -> Vec<String> {
    let reachable = snapshot.relation_graph().compute_reachable_set(start_item_id);
    snapshot
        .leaf_ids()
        .into_iter()
        .filter(|id| !reachable.contains(id))
        .collect()
}
