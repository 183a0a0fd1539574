//! Command types representing every snapshot operation
//!
//! Commands are the single entry point for mutations through the
//! functional-boundary `apply()` function.

use crate::model::ItemKind;
use crate::ops::RemovalMode;

/// Command enum representing all snapshot operations
///
/// Processed by [`crate::apply::apply`], which takes ownership of the
/// current snapshot, executes the command, and returns the new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add an item; `item_id` is generated when `None`
    AddItem {
        item_id: Option<String>,
        name: String,
        parent_id: Option<String>,
        kind: ItemKind,
        learning_object_ref: Option<String>,
    },

    RenameItem {
        item_id: String,
        name: String,
    },

    /// Set or clear a leaf's learning-object reference
    SetLearningObject {
        item_id: String,
        learning_object_ref: Option<String>,
    },

    /// Re-parent an item and its subtree (`None` = top level)
    MoveItem {
        item_id: String,
        new_parent_id: Option<String>,
    },

    /// Remove an item, its subtree and every touching relation
    RemoveItem {
        item_id: String,
        mode: RemovalMode,
    },

    AddRelation {
        from_item_id: String,
        to_item_id: String,
    },

    RemoveRelation {
        from_item_id: String,
        to_item_id: String,
    },

    SetStartItem {
        item_id: String,
    },

    /// DRAFT -> ACTIVE; `competing_active` is the program's currently
    /// ACTIVE snapshot as observed under the program lock
    Activate {
        competing_active: Option<String>,
    },

    /// ACTIVE -> COMPLETED
    Complete,

    /// Any non-archived state -> ARCHIVED
    Archive,
}

impl Command {
    /// Stable operation name, used as the `op` field in logs and errors
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::AddItem { .. } => "snapshot.add_item",
            Command::RenameItem { .. } => "snapshot.rename_item",
            Command::SetLearningObject { .. } => "snapshot.set_learning_object",
            Command::MoveItem { .. } => "snapshot.move_item",
            Command::RemoveItem { .. } => "snapshot.remove_item",
            Command::AddRelation { .. } => "snapshot.add_relation",
            Command::RemoveRelation { .. } => "snapshot.remove_relation",
            Command::SetStartItem { .. } => "snapshot.set_start_item",
            Command::Activate { .. } => "snapshot.activate",
            Command::Complete => "snapshot.complete",
            Command::Archive => "snapshot.archive",
        }
    }

    /// Whether the command changes items or relations (as opposed to status)
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Command::Activate { .. } | Command::Complete | Command::Archive
        )
    }
}
