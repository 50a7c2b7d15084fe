//! The attached container: owner of the request state machine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use consent_authority::PermissionAuthority;
use consent_core::{
    CancelReason, DeniedPermission, GrantStatus, PermissionName, PermissionOutcome,
    PermissionSet, RequestCode, RequestError, Result,
};
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::state::{replace_state, AskResults, RequestState};

/// Configuration for a container.
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    /// Correlation code attached to every ask this container issues.
    pub request_code: RequestCode,
}

/// Lifecycle phase of a container instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerPhase {
    /// Attached to the host, not yet usable.
    Attached,
    /// The host reported the container ready. Happens once.
    Ready,
    /// Torn down. Terminal.
    Destroyed,
}

/// A container attached to the host, owning at most one in-flight request.
pub struct PermissionContainer<A: PermissionAuthority> {
    /// The host's permission primitives.
    authority: A,
    /// Correlation code for asks from this instance.
    request_code: RequestCode,
    /// Serializes `request_permission` calls.
    request_lock: AsyncMutex<()>,
    /// The single in-flight request. Never held across an await.
    slot: Mutex<Option<RequestState>>,
    /// Generation counter for request states.
    next_id: AtomicU64,
    /// Lifecycle phase, observable by waiters.
    phase: watch::Sender<ContainerPhase>,
}

impl<A: PermissionAuthority> PermissionContainer<A> {
    /// Create a container in the [`ContainerPhase::Attached`] phase.
    pub fn new(authority: A, config: ContainerConfig) -> Self {
        let (phase, _) = watch::channel(ContainerPhase::Attached);
        Self {
            authority,
            request_code: config.request_code,
            request_lock: AsyncMutex::new(()),
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
            phase,
        }
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn request_code(&self) -> RequestCode {
        self.request_code
    }

    pub fn phase(&self) -> ContainerPhase {
        *self.phase.borrow()
    }

    /// Wait until the host reports this container ready.
    ///
    /// Resolves with [`CancelReason::Destroyed`] if the container is torn
    /// down first.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.phase.subscribe();
        let phase = rx
            .wait_for(|phase| *phase != ContainerPhase::Attached)
            .await
            .map(|phase| *phase)
            .map_err(|_| RequestError::Cancelled(CancelReason::Abandoned))?;
        if phase == ContainerPhase::Destroyed {
            return Err(RequestError::Cancelled(CancelReason::Destroyed));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve `permissions` through the check-then-ask protocol.
    ///
    /// Concurrent callers are served one at a time. A caller whose future is
    /// dropped mid-ask releases the lock and clears its own request state.
    pub async fn request_permission(&self, permissions: &PermissionSet) -> Result<PermissionOutcome> {
        let _guard = self.request_lock.lock().await;

        let (mut granted, denied): (Vec<PermissionName>, Vec<PermissionName>) = permissions
            .iter()
            .cloned()
            .partition(|name| self.authority.check_status(name).is_granted());

        if denied.is_empty() {
            tracing::debug!(permissions = ?granted, "all permissions already granted");
            return Ok(PermissionOutcome::granted(granted));
        }

        let answered: HashMap<PermissionName, GrantStatus> =
            if self.authority.supports_runtime_requests() {
                self.ask(denied.clone()).await?.into_iter().collect()
            } else {
                tracing::debug!(permissions = ?denied, "runtime requests unsupported, skipping ask");
                HashMap::new()
            };

        let mut still_denied = Vec::new();
        for name in denied {
            match answered.get(&name) {
                Some(GrantStatus::Granted) => granted.push(name),
                _ => still_denied.push(name),
            }
        }

        if still_denied.is_empty() {
            return Ok(PermissionOutcome::granted(granted));
        }

        let classified = still_denied
            .into_iter()
            .map(|name| {
                let needs_rationale = self.authority.should_show_rationale(&name);
                DeniedPermission::classify(name, needs_rationale)
            })
            .collect();
        Ok(PermissionOutcome::denied(granted, classified))
    }

    /// Install a request state for `names`, trigger the dialog, and wait.
    async fn ask(&self, names: Vec<PermissionName>) -> Result<AskResults> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (state, rx) = RequestState::new(id, names.clone());
        {
            let mut slot = self.lock_slot();
            if self.phase() == ContainerPhase::Destroyed {
                return Err(RequestError::Cancelled(CancelReason::Destroyed));
            }
            replace_state(&mut slot, Some(state));
        }
        let _clear = ClearOnDrop { slot: &self.slot, id };

        tracing::debug!(request_code = %self.request_code, permissions = ?names, "asking for permissions");
        self.authority.request_permissions(&names, self.request_code);

        rx.await
            .map_err(|_| RequestError::Cancelled(CancelReason::Abandoned))?
    }

    /// Whether an ask is outstanding.
    pub fn is_request_pending(&self) -> bool {
        self.lock_slot()
            .as_ref()
            .is_some_and(RequestState::is_pending)
    }

    /// Whether at least one of `names` is currently granted.
    pub fn is_permissions_granted(&self, names: &[PermissionName]) -> bool {
        names
            .iter()
            .any(|name| self.authority.check_status(name).is_granted())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Host signals
    // ─────────────────────────────────────────────────────────────────────────

    /// The host reports the container ready. Ignored after the first time
    /// and after teardown.
    pub fn on_ready(&self) {
        let changed = self.phase.send_if_modified(|phase| {
            if *phase == ContainerPhase::Attached {
                *phase = ContainerPhase::Ready;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!(request_code = %self.request_code, "container ready");
        }
    }

    /// The host returned to foreground.
    ///
    /// Re-issues a pending ask with the same names, since the dialog may have
    /// been dismissed in background. Returns whether an ask was issued.
    pub fn on_resume(&self) -> bool {
        let pending = self
            .lock_slot()
            .as_ref()
            .filter(|state| state.is_pending())
            .map(|state| state.permissions().to_vec());

        match pending {
            Some(names) => {
                tracing::debug!(request_code = %self.request_code, permissions = ?names, "re-asking after resume");
                self.authority.request_permissions(&names, self.request_code);
                true
            }
            None => false,
        }
    }

    /// The host tore the container down. Cancels any pending request.
    pub fn on_destroy(&self) {
        let mut slot = self.lock_slot();
        self.phase.send_replace(ContainerPhase::Destroyed);
        if let Some(mut state) = slot.take() {
            if state.fail(RequestError::Cancelled(CancelReason::Destroyed)) {
                tracing::debug!(permissions = ?state.permissions(), "pending request cancelled by teardown");
            }
        }
    }

    /// The host delivered the answer to an ask.
    ///
    /// Malformed or foreign data fails the pending request instead of being
    /// thrown back at the host. With nothing pending it is logged and dropped.
    pub fn on_permissions_result(
        &self,
        code: RequestCode,
        names: Vec<PermissionName>,
        results: Vec<GrantStatus>,
    ) {
        let mut slot = self.lock_slot();
        let Some(state) = slot.as_mut().filter(|s| s.is_pending()) else {
            tracing::warn!(request_code = %code, permissions = ?names, "permission result with no pending request");
            return;
        };

        let mismatch = if code != self.request_code {
            Some(format!(
                "result came with foreign request code {code}, expected {}",
                self.request_code
            ))
        } else if names.is_empty() && results.is_empty() {
            Some("result came empty, platform response was interrupted".to_string())
        } else if let Some(repeated) = first_repeat(&names) {
            Some(format!("result repeats {repeated} for requested {:?}", state.permissions()))
        } else if !state.matches(&names) {
            Some(format!(
                "result for {names:?} does not match requested {:?}",
                state.permissions()
            ))
        } else if names.len() != results.len() {
            Some(format!(
                "{} permissions but {} results",
                names.len(),
                results.len()
            ))
        } else {
            None
        };

        match mismatch {
            Some(message) => {
                tracing::warn!(request_code = %code, "{message}");
                state.fail(RequestError::Correlation(message));
            }
            None => {
                state.complete(names.into_iter().zip(results).collect());
            }
        }
    }

    /// Like [`Self::on_permissions_result`], decoding raw host status codes.
    pub fn on_raw_permissions_result(
        &self,
        code: RequestCode,
        names: Vec<PermissionName>,
        raw_results: Vec<i32>,
    ) {
        match raw_results
            .into_iter()
            .map(GrantStatus::try_from)
            .collect::<Result<Vec<_>>>()
        {
            Ok(results) => self.on_permissions_result(code, names, results),
            Err(err) => {
                tracing::warn!(request_code = %code, error = %err, "undecodable permission result");
                if let Some(state) = self.lock_slot().as_mut().filter(|s| s.is_pending()) {
                    state.fail(err);
                }
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<RequestState>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The first name that occurs more than once in `names`.
fn first_repeat(names: &[PermissionName]) -> Option<&PermissionName> {
    let mut seen = HashSet::new();
    names.iter().find(|name| !seen.insert(*name))
}

/// Clears the slot on scope exit if it still holds request `id`.
struct ClearOnDrop<'a> {
    slot: &'a Mutex<Option<RequestState>>,
    id: u64,
}

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|state| state.id() == self.id) {
            *slot = None;
        }
    }
}
