pub mod hierarchy;
pub mod invariants;
pub mod validation;

pub use hierarchy::{validate_insertion, MAX_DEPTH};
pub use validation::{validate_for_activation, validate_structure};
