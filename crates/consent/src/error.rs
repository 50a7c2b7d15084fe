//! Error types for the Coordinator.

use std::time::Duration;

use consent_core::{CancelReason, PermissionName, RequestError};
use thiserror::Error;

/// Errors that can occur during Coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The caller asked for zero permissions.
    #[error("cannot request 0 permissions")]
    EmptyRequest,

    /// `with_permissions` saw at least one denial.
    #[error("permissions were not granted: {denied:?}")]
    RequestFailed { denied: Vec<PermissionName> },

    /// The environment cancelled the request. Not a user decision.
    #[error("permission request cancelled: {0}")]
    Cancelled(CancelReason),

    /// The container did not become ready in time.
    #[error("container not ready after {0:?}")]
    Timeout(Duration),

    /// Callback correlation or decoding failed.
    #[error("request error: {0}")]
    Request(RequestError),
}

impl CoordinatorError {
    /// Whether this is a cancellation signal rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CoordinatorError::Cancelled(_))
    }
}

impl From<RequestError> for CoordinatorError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::EmptyRequest => CoordinatorError::EmptyRequest,
            RequestError::Cancelled(reason) => CoordinatorError::Cancelled(reason),
            other => CoordinatorError::Request(other),
        }
    }
}

/// Result type for Coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;
