//! Seed parser with validation
//!
//! Parses YAML and validates schema version, key uniqueness and that every
//! relation and the start item refer to declared keys. Hierarchy rules
//! (depth, leaf parents) are left to the core operations during import.

#![allow(clippy::result_large_err)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use snapline_core::model::ItemKind;

use crate::errors::{seed_validation, Result};
use crate::seed::format::SeedDocument;

/// Parse a seed file from a path
pub fn parse_seed_file(path: &Path) -> Result<SeedDocument> {
    let content = fs::read_to_string(path)
        .map_err(|e| seed_validation(&format!("Failed to read seed file: {}", e)))?;

    parse_seed_str(&content)
}

/// Parse a seed from a string
pub fn parse_seed_str(content: &str) -> Result<SeedDocument> {
    let seed: SeedDocument = serde_yaml::from_str(content)
        .map_err(|e| seed_validation(&format!("YAML parse error: {}", e)))?;

    validate_seed(&seed)?;

    Ok(seed)
}

fn validate_seed(seed: &SeedDocument) -> Result<()> {
    if seed.schema_version != 0 {
        return Err(seed_validation(&format!(
            "Unsupported schema_version: {}. Expected 0",
            seed.schema_version
        )));
    }

    if seed.program.trim().is_empty() {
        return Err(seed_validation("program must not be empty"));
    }

    let mut keys = HashSet::new();
    for (_, item) in seed.flatten() {
        if item.key.trim().is_empty() {
            return Err(seed_validation(&format!(
                "Item '{}' has an empty key",
                item.name
            )));
        }
        if !keys.insert(item.key.as_str()) {
            return Err(seed_validation(&format!("Duplicate item key: {}", item.key)));
        }
        if item.kind == ItemKind::Leaf && !item.children.is_empty() {
            return Err(seed_validation(&format!(
                "Leaf item '{}' cannot have children",
                item.key
            )));
        }
    }

    for relation in &seed.relations {
        for key in [&relation.from, &relation.to] {
            if !keys.contains(key.as_str()) {
                return Err(seed_validation(&format!(
                    "Relation {} -> {} references unknown item key: {}",
                    relation.from, relation.to, key
                )));
            }
        }
    }

    if let Some(start) = &seed.start {
        if !keys.contains(start.as_str()) {
            return Err(seed_validation(&format!("Unknown start item key: {}", start)));
        }
    }

    Ok(())
}
