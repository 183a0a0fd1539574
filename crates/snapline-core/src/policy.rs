//! Activation policy hook
//!
//! The lifecycle controller consults an [`ActivationPolicyHook`] after the
//! locks are held and before the activation is applied. Deployments plug in
//! their own publication rules (review sign-off, scheduling windows, ...);
//! the structural rules themselves are never delegated to a hook.

use crate::errors::{ExError, ExErrorKind};
use crate::model::Snapshot;

/// Policy hook for gating activation
pub trait ActivationPolicyHook: Send + Sync {
    /// Check whether `snapshot` may be activated.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::PolicyDenied` if activation is denied by policy.
    #[allow(clippy::result_large_err)]
    fn check(&self, snapshot: &Snapshot) -> std::result::Result<(), ExError>;
}

/// Always allows (CLI default and tests that don't exercise denial).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActivationPolicyHook;

impl ActivationPolicyHook for NoopActivationPolicyHook {
    fn check(&self, _: &Snapshot) -> std::result::Result<(), ExError> {
        Ok(())
    }
}

/// Always denies (for tests that verify a denied activation writes nothing).
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllActivationPolicyHook;

impl ActivationPolicyHook for DenyAllActivationPolicyHook {
    fn check(&self, snapshot: &Snapshot) -> std::result::Result<(), ExError> {
        Err(ExError::new(ExErrorKind::PolicyDenied)
            .with_snapshot_id(snapshot.id())
            .with_message("DenyAll policy hook"))
    }
}
