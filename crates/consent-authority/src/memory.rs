//! In-memory implementation of the PermissionAuthority trait.
//!
//! Grant state lives in a map; unknown permissions check as denied.
//! Asks are recorded and, when created with [`MemoryAuthority::channel`],
//! forwarded to a receiver so a test or a host shim can answer them.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use consent_core::{GrantStatus, PermissionName, RequestCode};
use tokio::sync::mpsc;

use crate::authority::PermissionAuthority;

/// One call to [`PermissionAuthority::request_permissions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskEvent {
    pub names: Vec<PermissionName>,
    pub code: RequestCode,
}

/// In-memory permission authority.
///
/// Thread-safe via RwLock.
pub struct MemoryAuthority {
    inner: RwLock<MemoryAuthorityInner>,
    asks_tx: Option<mpsc::UnboundedSender<AskEvent>>,
}

struct MemoryAuthorityInner {
    /// Current status per permission.
    statuses: HashMap<PermissionName, GrantStatus>,

    /// Permissions for which a rationale should be shown.
    rationale: HashSet<PermissionName>,

    /// Every ask, in order.
    asks: Vec<AskEvent>,

    /// Whether runtime asks are supported.
    runtime_requests: bool,
}

impl MemoryAuthority {
    /// Create an authority that only records asks.
    pub fn new() -> Self {
        Self::with_sender(None)
    }

    /// Create an authority that also forwards every ask to the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_sender(Some(tx)), rx)
    }

    fn with_sender(asks_tx: Option<mpsc::UnboundedSender<AskEvent>>) -> Self {
        Self {
            inner: RwLock::new(MemoryAuthorityInner {
                statuses: HashMap::new(),
                rationale: HashSet::new(),
                asks: Vec::new(),
                runtime_requests: true,
            }),
            asks_tx,
        }
    }

    /// Set the current status of a permission.
    pub fn set_status(&self, name: impl Into<PermissionName>, status: GrantStatus) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.statuses.insert(name.into(), status);
    }

    pub fn grant(&self, name: impl Into<PermissionName>) {
        self.set_status(name, GrantStatus::Granted);
    }

    pub fn deny(&self, name: impl Into<PermissionName>) {
        self.set_status(name, GrantStatus::Denied);
    }

    /// Set whether the host recommends a rationale for `name`.
    pub fn set_rationale(&self, name: impl Into<PermissionName>, show: bool) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let name = name.into();
        if show {
            inner.rationale.insert(name);
        } else {
            inner.rationale.remove(&name);
        }
    }

    /// Toggle runtime ask support.
    pub fn set_runtime_requests(&self, supported: bool) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.runtime_requests = supported;
    }

    /// Every ask issued so far.
    pub fn asks(&self) -> Vec<AskEvent> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.asks.clone()
    }

    /// Number of asks issued so far.
    pub fn ask_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.asks.len()
    }
}

impl Default for MemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionAuthority for MemoryAuthority {
    fn check_status(&self, name: &PermissionName) -> GrantStatus {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .statuses
            .get(name)
            .copied()
            .unwrap_or(GrantStatus::Denied)
    }

    fn should_show_rationale(&self, name: &PermissionName) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.rationale.contains(name)
    }

    fn request_permissions(&self, names: &[PermissionName], code: RequestCode) {
        let event = AskEvent {
            names: names.to_vec(),
            code,
        };
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.asks.push(event.clone());
        }
        tracing::debug!(request_code = %code, permissions = ?names, "consent dialog requested");
        if let Some(tx) = &self.asks_tx {
            // Nobody listening is the same as a dialog nobody answers.
            let _ = tx.send(event);
        }
    }

    fn supports_runtime_requests(&self) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.runtime_requests
    }
}
