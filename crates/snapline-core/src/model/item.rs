use serde::{Deserialize, Serialize};

/// Kind of a node in the curriculum tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A folder; may own children, never carries content
    Container,
    /// A learning item; may carry a learning-object reference, never owns children
    Leaf,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Container => "container",
            ItemKind::Leaf => "leaf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "container" => Some(ItemKind::Container),
            "leaf" => Some(ItemKind::Leaf),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SnapshotItem - a node in the curriculum tree
///
/// Items form a bounded-depth tree through `parent_id`. The parent owns the
/// ordering of its children (`position`) but not their lifetime: removing an
/// item is always an explicit aggregate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// Stable identifier (UUID v7)
    pub id: String,

    /// Display name
    pub name: String,

    /// Owning container, `None` for top-level items
    pub parent_id: Option<String>,

    pub kind: ItemKind,

    /// Reference to the learning object delivered by this item (leaves only)
    pub learning_object_ref: Option<String>,

    /// Nesting depth, 0 for top-level items
    pub depth: u8,

    /// Ordering position among siblings, assigned by the parent on insertion
    pub position: u32,
}

impl SnapshotItem {
    pub fn new(id: String, name: String, kind: ItemKind) -> Self {
        Self {
            id,
            name,
            parent_id: None,
            kind,
            learning_object_ref: None,
            depth: 0,
            position: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == ItemKind::Leaf
    }

    pub fn is_container(&self) -> bool {
        self.kind == ItemKind::Container
    }
}
