//! Error types shared by every consent layer.

use std::fmt;

use thiserror::Error;

use crate::types::PermissionName;

/// Why a pending request was cancelled instead of completing.
///
/// Cancellation is never a user decision. Callers that branch on
/// "did the user deny this" must treat these separately from
/// [`crate::PermissionOutcome::Denied`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// The attached container was torn down while the request was outstanding.
    Destroyed,

    /// A new request state was installed over an unresolved one.
    Superseded {
        previous: Vec<PermissionName>,
        next: Vec<PermissionName>,
    },

    /// The completion handle was dropped without ever being resolved.
    Abandoned,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Destroyed => write!(f, "container destroyed"),
            CancelReason::Superseded { previous, next } => write!(
                f,
                "request with [{}] created while request with [{}] was running",
                join(next),
                join(previous)
            ),
            CancelReason::Abandoned => write!(f, "completion handle dropped"),
        }
    }
}

/// Errors that can occur while resolving a permission request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The caller asked for zero permissions.
    #[error("cannot request 0 permissions")]
    EmptyRequest,

    /// The request was cancelled by the environment, not denied by the user.
    #[error("permission request cancelled: {0}")]
    Cancelled(CancelReason),

    /// Callback data could not be attributed to the pending request.
    #[error("callback correlation failed: {0}")]
    Correlation(String),

    /// The host reported a status code outside the known set.
    #[error("unexpected permission status code: {0}")]
    UnexpectedStatus(i32),
}

impl RequestError {
    /// Whether this error is a cancellation signal rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RequestError::Cancelled(_))
    }

    /// The cancellation reason, if this is a cancellation.
    pub fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            RequestError::Cancelled(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Result type for request operations.
pub type Result<T> = std::result::Result<T, RequestError>;

pub(crate) fn join(names: &[PermissionName]) -> String {
    names
        .iter()
        .map(PermissionName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
