use crate::errors::{Result, SnapshotError};
use crate::model::Snapshot;

/// Compute the ancestor path of an item
///
/// The sequence of item ids from the top-level ancestor down to `item_id`
/// (inclusive), following parent references upward and then reversing.
///
/// # Errors
/// * `ItemNotFound` - Item doesn't exist
/// * `Internal` - A parent reference is broken or loops back on itself
pub fn ancestor_path(snapshot: &Snapshot, item_id: &str) -> Result<Vec<String>> {
    snapshot.get_item(item_id)?;

    let mut path = Vec::new();
    let mut current = Some(item_id);

    while let Some(id) = current {
        // Depth is bounded, so a longer chain means a loop
        if path.len() > usize::from(crate::rules::MAX_DEPTH) {
            return Err(SnapshotError::Internal {
                message: format!("parent chain of {} does not terminate", item_id),
            });
        }
        path.push(id.to_string());

        let item = snapshot
            .get_item(id)
            .map_err(|_| SnapshotError::Internal {
                message: format!("parent chain of {} is broken at {}", item_id, id),
            })?;
        current = item.parent_id.as_deref();
    }

    path.reverse();
    Ok(path)
}
