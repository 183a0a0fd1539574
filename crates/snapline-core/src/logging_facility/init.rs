//! Logging initialization module

use std::sync::Once;

use serde::Deserialize;
use snapline_core_types::schema::{FIELD_REQUEST_ID, FIELD_TRACE_ID};
use snapline_core_types::RequestContext;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Human-readable output for development
    #[default]
    Development,
    /// JSON structured output for production
    Production,
    /// Bare registry; tests install their own capture layer
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at application startup; later calls are no-ops. `RUST_LOG`
/// overrides the profile's default filter. Output goes to stderr so that
/// command output on stdout stays machine-readable.
///
/// # Profiles
///
/// - **Development**: Human-readable logs, `snapline=debug`
/// - **Production**: JSON structured logs, `snapline=info`
/// - **Test**: no output
///
/// # Example
///
/// ```
/// use snapline_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        // A subscriber installed elsewhere (e.g. test capture) wins
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("snapline=debug")),
                )
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("snapline=info")),
                )
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}

/// Span carrying the request's correlation ids
///
/// Enter it around an engine call so every event inside inherits
/// `request_id` and (when present) `trace_id`.
pub fn request_span(ctx: &RequestContext) -> tracing::Span {
    let span = tracing::info_span!(
        "request",
        request_id = tracing::field::Empty,
        trace_id = tracing::field::Empty
    );
    span.record(FIELD_REQUEST_ID, ctx.request_id.as_str());
    if let Some(trace_id) = &ctx.trace_id {
        span.record(FIELD_TRACE_ID, trace_id.as_str());
    }
    span
}
