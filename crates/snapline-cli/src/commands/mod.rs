pub mod seed;
pub mod snapshot;
