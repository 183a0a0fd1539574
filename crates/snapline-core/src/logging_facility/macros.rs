//! Canonical logging macros
//!
//! Field names come from `snapline_core_types::schema`; the crate is
//! re-exported as `snapline_core::core_types` so callers need no extra
//! dependency.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use snapline_core::log_op_start;
/// log_op_start!("snapshot.activate");
/// log_op_start!("snapshot.activate", snapshot_id = "s-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($($field)+)?
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use snapline_core::log_op_end;
/// log_op_end!("snapshot.activate", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        );
    };
}

/// Log an operation error
///
/// `$err` is borrowed and cloned, so the error can still be returned
/// afterwards. Anything convertible into `ExError` is accepted.
///
/// # Example
///
/// ```
/// # use snapline_core::{log_op_error, errors::SnapshotError};
/// let err = SnapshotError::SnapshotNotFound { snapshot_id: "s1".to_string() };
/// log_op_error!("snapshot.load", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = ::core::clone::Clone::clone(&$err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            error = %ex_err,
            $($($field)+)?
        );
    }};
}
