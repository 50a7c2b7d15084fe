//! The Coordinator: unified API for permission requests.
//!
//! The Coordinator resolves the host's attached container, waits for it to
//! become ready, and hands requests to its state machine. It holds no
//! permission state of its own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use consent_core::{Granted, PermissionName, PermissionOutcome, PermissionSet};
use consent_request::ContainerPhase;
use tokio::sync::Mutex;

use crate::error::{CoordinatorError, Result};
use crate::host::{Host, HostContainer};

/// Tag under which the coordinator's container is attached.
pub const DEFAULT_CONTAINER_TAG: &str = "CONSENT_CONTAINER";

/// Configuration for the Coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Tag of the container in the host's container manager.
    pub tag: String,
    /// Upper bound on attaching plus waiting for readiness. `None` waits forever.
    pub ready_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_CONTAINER_TAG.to_string(),
            ready_timeout: None,
        }
    }
}

/// The main Coordinator struct.
///
/// Provides:
/// - Requesting permissions with a single well-defined outcome
/// - Running a continuation only when everything was granted
/// - Querying pending and granted state
pub struct Coordinator<H: Host> {
    /// The host the container is attached to.
    host: Arc<H>,
    /// Configuration.
    config: CoordinatorConfig,
    /// Serializes find-or-attach.
    attach_lock: Mutex<()>,
}

impl<H: Host> Coordinator<H> {
    /// Create a new coordinator against `host`.
    pub fn new(host: Arc<H>, config: CoordinatorConfig) -> Self {
        Self {
            host,
            config,
            attach_lock: Mutex::new(()),
        }
    }

    /// Get the host reference.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Request `names` and return the outcome.
    ///
    /// Fails with [`CoordinatorError::EmptyRequest`] before touching the host
    /// when `names` is empty, and with [`CoordinatorError::Cancelled`] when
    /// the container is torn down mid-request.
    pub async fn request<I, N>(&self, names: I) -> Result<PermissionOutcome>
    where
        I: IntoIterator<Item = N>,
        N: Into<PermissionName>,
    {
        let permissions = PermissionSet::new(names)?;
        let container = self.container().await?;
        let outcome = container.request_permission(&permissions).await?;
        tracing::debug!(
            tag = %self.config.tag,
            granted = outcome.is_granted(),
            "permission request resolved"
        );
        Ok(outcome)
    }

    /// Request `names` and run `on_success` only if all were granted.
    ///
    /// A denial surfaces as [`CoordinatorError::RequestFailed`].
    pub async fn with_permissions<I, N, F, Fut, T>(&self, names: I, on_success: F) -> Result<T>
    where
        I: IntoIterator<Item = N>,
        N: Into<PermissionName>,
        F: FnOnce(Granted) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.request(names).await? {
            PermissionOutcome::Granted(granted) => Ok(on_success(granted).await),
            PermissionOutcome::Denied(denied) => Err(CoordinatorError::RequestFailed {
                denied: denied.all_denied().into_iter().cloned().collect(),
            }),
        }
    }

    /// Whether the attached container has an unresolved ask.
    pub async fn is_request_pending(&self) -> Result<bool> {
        Ok(self.container().await?.is_request_pending())
    }

    /// Whether at least one of `names` is currently granted.
    ///
    /// This is an "any" check. Use the outcome of [`Self::request`] to learn
    /// whether all of them are granted.
    pub async fn is_permissions_granted<I, N>(&self, names: I) -> Result<bool>
    where
        I: IntoIterator<Item = N>,
        N: Into<PermissionName>,
    {
        let names: Vec<PermissionName> = names.into_iter().map(Into::into).collect();
        Ok(self.container().await?.is_permissions_granted(&names))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Container resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Find or attach the container and wait until it is ready.
    async fn container(&self) -> Result<Arc<HostContainer<H>>> {
        let resolve = async {
            let container = self.attached_container().await?;
            container.wait_ready().await?;
            Ok::<_, CoordinatorError>(container)
        };

        match self.config.ready_timeout {
            Some(limit) => tokio::time::timeout(limit, resolve).await.map_err(|_| {
                tracing::warn!(tag = %self.config.tag, timeout = ?limit, "container not ready in time");
                CoordinatorError::Timeout(limit)
            })?,
            None => resolve.await,
        }
    }

    async fn attached_container(&self) -> Result<Arc<HostContainer<H>>> {
        let _guard = self.attach_lock.lock().await;

        if let Some(container) = self.host.find_container(&self.config.tag) {
            if container.phase() != ContainerPhase::Destroyed {
                return Ok(container);
            }
        }

        tracing::debug!(tag = %self.config.tag, "attaching container");
        self.host.attach_container(&self.config.tag).await
    }
}
