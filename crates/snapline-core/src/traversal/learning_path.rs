use crate::errors::{Result, SnapshotError};
use crate::model::Snapshot;

/// Compute the learning path of a snapshot
///
/// Breadth-first order of leaf ids starting at the start item and following
/// relation edges; at each branch, successors are visited in id order. The
/// result is deterministic for a given structure.
///
/// Leaves not reachable from the start item are omitted; for an activated
/// snapshot there are none.
///
/// # Errors
/// * `StartItemMissing` - No start item designated
pub fn learning_path(snapshot: &Snapshot) -> Result<Vec<String>> {
    let start = snapshot
        .start_item_id()
        .ok_or_else(|| SnapshotError::StartItemMissing {
            snapshot_id: snapshot.id().to_string(),
        })?;

    Ok(snapshot.relation_graph().breadth_first_order(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;
    use crate::ops::item_ops::add_item_with_id;
    use crate::ops::relation_ops::{add_relation, set_start_item};

    #[test]
    fn test_branching_path_is_breadth_first_by_id() {
        let mut s = Snapshot::new("s".into(), "p".into());
        for id in ["start", "c", "b", "d"] {
            add_item_with_id(&mut s, id.into(), id.into(), None, ItemKind::Leaf, None).unwrap();
        }
        add_relation(&mut s, "start", "c").unwrap();
        add_relation(&mut s, "start", "b").unwrap();
        add_relation(&mut s, "b", "d").unwrap();
        set_start_item(&mut s, "start").unwrap();

        assert_eq!(learning_path(&s).unwrap(), vec!["start", "b", "c", "d"]);
    }

    #[test]
    fn test_learning_path_requires_start() {
        let s = Snapshot::new("s".into(), "p".into());
        assert!(matches!(
            learning_path(&s),
            Err(SnapshotError::StartItemMissing { .. })
        ));
    }
}
