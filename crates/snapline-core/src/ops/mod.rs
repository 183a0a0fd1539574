pub mod item_ops;
pub mod lifecycle_ops;
pub mod relation_ops;

pub use item_ops::RemovalMode;
