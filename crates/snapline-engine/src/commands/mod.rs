//! Command orchestration layer.
//!
//! Provides the request-level entry point that runs controller operations
//! under a correlation span.

pub mod engine_command;
