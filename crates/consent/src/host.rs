//! Host abstraction: where containers are attached.
//!
//! A host owns the container manager and forwards its lifecycle signals
//! (ready, resume, destroy) and permission callbacks to the container.
//! Containers must survive host recreation: a host binding keeps the
//! attached container, and its pending request, across configuration changes.

use std::sync::Arc;

use async_trait::async_trait;
use consent_authority::PermissionAuthority;
use consent_request::PermissionContainer;

use crate::error::Result;

/// Container type attached by host `H`.
pub type HostContainer<H> = PermissionContainer<<H as Host>::Authority>;

/// Host trait for finding and attaching permission containers.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Host: Send + Sync {
    /// The permission primitives containers on this host use.
    type Authority: PermissionAuthority;

    /// Find the container attached under `tag`, if any.
    fn find_container(&self, tag: &str) -> Option<Arc<PermissionContainer<Self::Authority>>>;

    /// Create a container and attach it under `tag`.
    ///
    /// Resolves once the host has committed the attachment. Readiness is
    /// signalled separately through [`PermissionContainer::on_ready`].
    async fn attach_container(&self, tag: &str)
        -> Result<Arc<PermissionContainer<Self::Authority>>>;
}

/// A simple in-memory host for testing.
///
/// Containers live in a map keyed by tag. Lifecycle signals are driven by
/// hand, or automatically when configured.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{PoisonError, RwLock};

    use consent_authority::MemoryAuthority;
    use consent_core::{GrantStatus, PermissionName, RequestCode};
    use consent_request::ContainerConfig;
    use tokio::sync::watch;

    type Container = PermissionContainer<Arc<MemoryAuthority>>;

    /// Configuration for the memory host.
    #[derive(Debug, Clone)]
    pub struct MemoryHostConfig {
        /// Whether the host itself starts out created.
        pub created: bool,
        /// Whether attached containers report ready on commit.
        pub auto_ready: bool,
        /// Configuration handed to every container.
        pub container: ContainerConfig,
    }

    impl Default for MemoryHostConfig {
        fn default() -> Self {
            Self {
                created: true,
                auto_ready: true,
                container: ContainerConfig::default(),
            }
        }
    }

    /// In-memory host implementation.
    pub struct MemoryHost {
        authority: Arc<MemoryAuthority>,
        config: MemoryHostConfig,
        containers: RwLock<HashMap<String, Arc<Container>>>,
        created: watch::Sender<bool>,
    }

    impl MemoryHost {
        /// Create a host with the default configuration.
        pub fn new(authority: Arc<MemoryAuthority>) -> Self {
            Self::with_config(authority, MemoryHostConfig::default())
        }

        pub fn with_config(authority: Arc<MemoryAuthority>, config: MemoryHostConfig) -> Self {
            let (created, _) = watch::channel(config.created);
            Self {
                authority,
                config,
                containers: RwLock::new(HashMap::new()),
                created,
            }
        }

        pub fn authority(&self) -> &Arc<MemoryAuthority> {
            &self.authority
        }

        /// Mark the host created, releasing pending attachments.
        pub fn mark_created(&self) {
            self.created.send_replace(true);
        }

        /// The container attached under `tag`.
        pub fn container(&self, tag: &str) -> Option<Arc<Container>> {
            let containers = self.containers.read().unwrap_or_else(PoisonError::into_inner);
            containers.get(tag).cloned()
        }

        /// Signal readiness to the container under `tag`.
        pub fn ready(&self, tag: &str) -> bool {
            self.container(tag).map(|c| c.on_ready()).is_some()
        }

        /// Signal return from background. Returns whether an ask was re-issued.
        pub fn resume(&self, tag: &str) -> bool {
            self.container(tag).is_some_and(|c| c.on_resume())
        }

        /// Tear down the container under `tag`.
        pub fn destroy(&self, tag: &str) -> bool {
            let removed = {
                let mut containers =
                    self.containers.write().unwrap_or_else(PoisonError::into_inner);
                containers.remove(tag)
            };
            match removed {
                Some(container) => {
                    tracing::debug!(tag, "destroying container");
                    container.on_destroy();
                    true
                }
                None => false,
            }
        }

        /// Simulate a configuration change.
        ///
        /// Containers are retained; the recreated host resumes each of them.
        /// Returns how many pending asks were re-issued.
        pub fn recreate(&self) -> usize {
            let containers: Vec<Arc<Container>> = {
                let containers = self.containers.read().unwrap_or_else(PoisonError::into_inner);
                containers.values().cloned().collect()
            };
            tracing::debug!(containers = containers.len(), "host recreated");
            containers.iter().filter(|c| c.on_resume()).count()
        }

        /// Deliver a permission callback to the container under `tag`.
        pub fn dispatch_result(
            &self,
            tag: &str,
            code: RequestCode,
            names: Vec<PermissionName>,
            results: Vec<GrantStatus>,
        ) -> bool {
            match self.container(tag) {
                Some(container) => {
                    container.on_permissions_result(code, names, results);
                    true
                }
                None => {
                    tracing::warn!(tag, request_code = %code, "permission result for unknown container");
                    false
                }
            }
        }

        async fn wait_created(&self) {
            let mut rx = self.created.subscribe();
            // The sender lives in self, so the channel cannot close here.
            let _ = rx.wait_for(|created| *created).await;
        }
    }

    #[async_trait]
    impl Host for MemoryHost {
        type Authority = Arc<MemoryAuthority>;

        fn find_container(&self, tag: &str) -> Option<Arc<Container>> {
            self.container(tag)
        }

        async fn attach_container(&self, tag: &str) -> Result<Arc<Container>> {
            self.wait_created().await;

            let container = {
                let mut containers =
                    self.containers.write().unwrap_or_else(PoisonError::into_inner);
                containers
                    .entry(tag.to_string())
                    .or_insert_with(|| {
                        Arc::new(PermissionContainer::new(
                            Arc::clone(&self.authority),
                            self.config.container.clone(),
                        ))
                    })
                    .clone()
            };
            tracing::debug!(tag, "container attached");

            if self.config.auto_ready {
                container.on_ready();
            }
            Ok(container)
        }
    }
}
