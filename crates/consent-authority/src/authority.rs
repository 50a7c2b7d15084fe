//! PermissionAuthority trait: the host's permission primitives.

use std::sync::Arc;

use consent_core::{GrantStatus, PermissionName, RequestCode};

/// The host's permission primitives.
///
/// Status and rationale queries are treated as stateless and safe to call
/// concurrently. Only [`PermissionAuthority::request_permissions`] has a
/// side effect, and the coordinator serializes it.
///
/// # Design Notes
///
/// - **Fire-and-forget asks**: `request_permissions` returns immediately.
///   The host must later deliver exactly one callback carrying `code`,
///   the names it asked for, and one status per name.
/// - **Rationale**: only meaningful for a permission that is currently denied.
pub trait PermissionAuthority: Send + Sync + 'static {
    /// Current grant status of `name`.
    fn check_status(&self, name: &PermissionName) -> GrantStatus;

    /// Whether the host recommends explaining `name` before asking again.
    fn should_show_rationale(&self, name: &PermissionName) -> bool;

    /// Show the host's consent dialog for `names`.
    fn request_permissions(&self, names: &[PermissionName], code: RequestCode);

    /// Whether the platform can ask the user at runtime at all.
    ///
    /// Platforms without a runtime dialog grant permissions at install time;
    /// a denied permission there stays denied without asking.
    fn supports_runtime_requests(&self) -> bool {
        true
    }
}

impl<A: PermissionAuthority + ?Sized> PermissionAuthority for Arc<A> {
    fn check_status(&self, name: &PermissionName) -> GrantStatus {
        (**self).check_status(name)
    }

    fn should_show_rationale(&self, name: &PermissionName) -> bool {
        (**self).should_show_rationale(name)
    }

    fn request_permissions(&self, names: &[PermissionName], code: RequestCode) {
        (**self).request_permissions(names, code)
    }

    fn supports_runtime_requests(&self) -> bool {
        (**self).supports_runtime_requests()
    }
}
