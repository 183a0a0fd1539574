//! Seed import system
//!
//! Provides:
//! - Seed format v0 schema (nested YAML item tree plus relations)
//! - YAML parser with validation
//! - Seed digest over the canonical JSON form
//! - Importer building a DRAFT snapshot through the core `apply()` boundary

pub mod format;
pub mod importer;
pub mod parser;

pub use format::{SeedDocument, SeedItem, SeedRelation};
pub use importer::{compute_seed_digest, import_seed, SeedImportReport};
pub use parser::{parse_seed_file, parse_seed_str};
