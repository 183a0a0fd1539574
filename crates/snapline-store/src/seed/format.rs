//! Seed format v0 schema
//!
//! Items are written as a nested tree and referenced by seed-local keys;
//! the importer maps every key to a fresh item id.
//!
//! ```yaml
//! schema_version: 0
//! program: rust-101
//! start: intro
//! items:
//!   - key: week-1
//!     name: Week 1
//!     kind: container
//!     children:
//!       - { key: intro, name: Introduction, kind: leaf, learning_object: lo-intro }
//!       - { key: ownership, name: Ownership, kind: leaf }
//! relations:
//!   - { from: intro, to: ownership }
//! ```

use serde::{Deserialize, Serialize};
use snapline_core::model::ItemKind;

/// Top-level seed file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDocument {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Program the imported snapshot belongs to
    pub program: String,

    /// Request activation after import
    #[serde(default)]
    pub activate: bool,

    /// Key of the start item
    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub items: Vec<SeedItem>,

    #[serde(default)]
    pub relations: Vec<SeedRelation>,
}

/// Item definition; `children` only makes sense on containers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedItem {
    /// Seed-local key, unique within the document
    pub key: String,

    pub name: String,

    pub kind: ItemKind,

    #[serde(default)]
    pub learning_object: Option<String>,

    #[serde(default)]
    pub children: Vec<SeedItem>,
}

/// "from comes before to", by seed key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRelation {
    pub from: String,
    pub to: String,
}

impl SeedDocument {
    /// All items in pre-order, paired with their parent's key
    pub fn flatten(&self) -> Vec<(Option<&str>, &SeedItem)> {
        let mut out = Vec::new();
        for item in &self.items {
            flatten_into(None, item, &mut out);
        }
        out
    }
}

fn flatten_into<'a>(
    parent: Option<&'a str>,
    item: &'a SeedItem,
    out: &mut Vec<(Option<&'a str>, &'a SeedItem)>,
) {
    out.push((parent, item));
    for child in &item.children {
        flatten_into(Some(item.key.as_str()), child, out);
    }
}
