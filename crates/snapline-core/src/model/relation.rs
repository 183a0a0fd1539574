use serde::{Deserialize, Serialize};

/// SnapshotRelation - directed "comes before" edge between two leaf items
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotRelation {
    pub from_item_id: String,
    pub to_item_id: String,
}

impl SnapshotRelation {
    pub fn new(from_item_id: impl Into<String>, to_item_id: impl Into<String>) -> Self {
        Self {
            from_item_id: from_item_id.into(),
            to_item_id: to_item_id.into(),
        }
    }

    /// Whether either endpoint is `item_id`
    pub fn touches(&self, item_id: &str) -> bool {
        self.from_item_id == item_id || self.to_item_id == item_id
    }
}
