//! Structured logging facility for Snapline
//!
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Correlation propagation via request spans
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use snapline_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! # Ownership
//!
//! Operation boundaries (start/end/error) are logged by the engine only.
//! The core and store emit `tracing::debug!` details and never boundary
//! events, so one request produces exactly one start and one end.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, request_span, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
