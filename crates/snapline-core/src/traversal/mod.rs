pub mod learning_path;
pub mod path;

pub use learning_path::learning_path;
pub use path::ancestor_path;
