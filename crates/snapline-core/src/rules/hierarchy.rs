use crate::errors::{Result, SnapshotError};
use crate::model::{Snapshot, SnapshotItem};

/// Maximum nesting depth; top-level items sit at depth 0
pub const MAX_DEPTH: u8 = 3;

/// Check that `item` may be inserted under `parent` and return its depth
///
/// `None` places the item at the top level (depth 0). The item's own kind
/// matters too: only a leaf may carry a learning-object reference. Pure
/// function: called before every structural mutation, never mutates
/// anything itself.
///
/// # Errors
///
/// * `LearningObjectOnContainer` - `item` is a container with a learning object
/// * `InvalidParentKind` - `parent` is a leaf
/// * `DepthExceeded` - the resulting depth would exceed [`MAX_DEPTH`]
pub fn validate_insertion(item: &SnapshotItem, parent: Option<&SnapshotItem>) -> Result<u8> {
    if item.is_container() && item.learning_object_ref.is_some() {
        return Err(SnapshotError::LearningObjectOnContainer {
            item_id: item.id.clone(),
        });
    }
    validate_placement(parent, 0)
}

/// Like [`validate_insertion`], for a subtree whose deepest descendant sits
/// `subtree_height` levels below its root
///
/// # Errors
///
/// Same as [`validate_insertion`]; `DepthExceeded` reports the depth the
/// deepest descendant would end up at.
pub fn validate_placement(parent: Option<&SnapshotItem>, subtree_height: u8) -> Result<u8> {
    let Some(parent) = parent else {
        return check_depth("<root>", 0, subtree_height);
    };

    if !parent.is_container() {
        return Err(SnapshotError::InvalidParentKind {
            parent_id: parent.id.clone(),
        });
    }

    let depth = parent.depth.saturating_add(1);
    check_depth(&parent.id, depth, subtree_height)
}

fn check_depth(parent_id: &str, depth: u8, subtree_height: u8) -> Result<u8> {
    let deepest = depth.saturating_add(subtree_height);
    if deepest > MAX_DEPTH {
        return Err(SnapshotError::DepthExceeded {
            parent_id: parent_id.to_string(),
            depth: deepest,
            max_depth: MAX_DEPTH,
        });
    }
    Ok(depth)
}

/// Number of levels between `item_id` and its deepest descendant (0 for a
/// childless item)
pub fn subtree_height(snapshot: &Snapshot, item_id: &str) -> u8 {
    let Ok(root) = snapshot.get_item(item_id) else {
        return 0;
    };
    snapshot
        .subtree_ids(item_id)
        .iter()
        .filter_map(|id| snapshot.get_item(id).ok())
        .map(|item| item.depth.saturating_sub(root.depth))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    fn container(id: &str, depth: u8) -> SnapshotItem {
        let mut item = SnapshotItem::new(id.to_string(), id.to_string(), ItemKind::Container);
        item.depth = depth;
        item
    }

    fn leaf(id: &str) -> SnapshotItem {
        SnapshotItem::new(id.to_string(), id.to_uppercase(), ItemKind::Leaf)
    }

    #[test]
    fn test_top_level_item_has_depth_zero() {
        assert_eq!(validate_insertion(&leaf("new"), None).unwrap(), 0);
        assert_eq!(validate_insertion(&container("new", 0), None).unwrap(), 0);
    }

    #[test]
    fn test_child_depth_is_parent_plus_one() {
        assert_eq!(validate_insertion(&leaf("new"), Some(&container("c", 0))).unwrap(), 1);
        assert_eq!(validate_insertion(&container("new", 0), Some(&container("c", 2))).unwrap(), 3);
    }

    #[test]
    fn test_child_under_depth_three_rejected() {
        let result = validate_insertion(&leaf("new"), Some(&container("deep", 3)));
        assert_eq!(
            result,
            Err(SnapshotError::DepthExceeded {
                parent_id: "deep".to_string(),
                depth: 4,
                max_depth: 3,
            })
        );
    }

    #[test]
    fn test_leaf_parent_rejected() {
        assert!(matches!(
            validate_insertion(&leaf("new"), Some(&leaf("l"))),
            Err(SnapshotError::InvalidParentKind { .. })
        ));
    }

    #[test]
    fn test_learning_object_only_on_leaf() {
        let mut lesson = leaf("lesson");
        lesson.learning_object_ref = Some("lo-1".to_string());
        assert_eq!(validate_insertion(&lesson, Some(&container("c", 0))).unwrap(), 1);

        let mut folder = container("folder", 0);
        folder.learning_object_ref = Some("lo-1".to_string());
        assert_eq!(
            validate_insertion(&folder, Some(&container("c", 0))),
            Err(SnapshotError::LearningObjectOnContainer {
                item_id: "folder".to_string(),
            })
        );
    }

    #[test]
    fn test_placement_accounts_for_subtree_height() {
        assert_eq!(validate_placement(Some(&container("c", 1)), 1).unwrap(), 2);
        assert!(matches!(
            validate_placement(Some(&container("c", 1)), 2),
            Err(SnapshotError::DepthExceeded { depth: 4, .. })
        ));
    }
}
