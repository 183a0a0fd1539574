pub mod outline;

pub use outline::render_outline;
