//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use consent::authority::{AskEvent, MemoryAuthority};
use consent::host::memory::{MemoryHost, MemoryHostConfig};
use consent::{
    Coordinator, CoordinatorConfig, GrantStatus, PermissionName, PermissionOutcome,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How a scripted user answers consent dialogs.
#[derive(Debug, Clone)]
pub struct DialogScript {
    /// Per-permission answers.
    pub answers: HashMap<PermissionName, GrantStatus>,
    /// Answer for permissions not listed.
    pub default: GrantStatus,
    /// Deliver names in reverse of the asked order.
    pub reverse: bool,
}

impl DialogScript {
    /// Answer every dialog with `status`.
    pub fn answer_all(status: GrantStatus) -> Self {
        Self {
            answers: HashMap::new(),
            default: status,
            reverse: false,
        }
    }

    /// Set the answer for one permission.
    pub fn with(mut self, name: impl Into<PermissionName>, status: GrantStatus) -> Self {
        self.answers.insert(name.into(), status);
        self
    }

    /// Deliver results out of order.
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// The callback payload for an ask.
    pub fn respond(&self, ask: &AskEvent) -> (Vec<PermissionName>, Vec<GrantStatus>) {
        let mut names = ask.names.clone();
        if self.reverse {
            names.reverse();
        }
        let results = names
            .iter()
            .map(|name| self.answers.get(name).copied().unwrap_or(self.default))
            .collect();
        (names, results)
    }
}

/// A memory host, authority, and coordinator wired together.
pub struct Fixture {
    pub authority: Arc<MemoryAuthority>,
    pub host: Arc<MemoryHost>,
    pub coordinator: Arc<Coordinator<MemoryHost>>,
    asks: Option<mpsc::UnboundedReceiver<AskEvent>>,
}

impl Fixture {
    /// Create a fixture with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryHostConfig::default(), CoordinatorConfig::default())
    }

    pub fn with_config(host_config: MemoryHostConfig, config: CoordinatorConfig) -> Self {
        let (authority, asks) = MemoryAuthority::channel();
        let authority = Arc::new(authority);
        let host = Arc::new(MemoryHost::with_config(Arc::clone(&authority), host_config));
        let coordinator = Arc::new(Coordinator::new(Arc::clone(&host), config));
        Self {
            authority,
            host,
            coordinator,
            asks: Some(asks),
        }
    }

    /// The tag of the fixture coordinator's container.
    pub fn tag(&self) -> &str {
        &self.coordinator.config().tag
    }

    /// Wait for the next consent dialog.
    ///
    /// Panics if a responder already owns the dialogs.
    pub async fn next_ask(&mut self) -> AskEvent {
        self.asks
            .as_mut()
            .expect("asks are owned by a responder")
            .recv()
            .await
            .expect("authority dropped")
    }

    /// The next consent dialog, if one was already shown.
    pub fn try_next_ask(&mut self) -> Option<AskEvent> {
        self.asks.as_mut().and_then(|asks| asks.try_recv().ok())
    }

    /// Deliver `results` for `ask` to the fixture's container.
    pub fn answer(&self, ask: &AskEvent, results: Vec<GrantStatus>) -> bool {
        self.host
            .dispatch_result(self.tag(), ask.code, ask.names.clone(), results)
    }

    /// Run a request on a background task.
    pub fn spawn_request<N>(&self, names: Vec<N>) -> JoinHandle<consent::Result<PermissionOutcome>>
    where
        N: Into<PermissionName> + Send + 'static,
    {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move { coordinator.request(names).await })
    }

    /// Answer every dialog on a background task according to `script`.
    ///
    /// Granted answers are also recorded in the authority, as a host would.
    pub fn spawn_responder(&mut self, script: DialogScript) -> JoinHandle<()> {
        let mut asks = self.asks.take().expect("responder already running");
        let host = Arc::clone(&self.host);
        let authority = Arc::clone(&self.authority);
        let tag = self.tag().to_string();
        tokio::spawn(async move {
            while let Some(ask) = asks.recv().await {
                let (names, results) = script.respond(&ask);
                for (name, status) in names.iter().zip(&results) {
                    authority.set_status(name.clone(), *status);
                }
                tracing::trace!(permissions = ?names, "scripted dialog answered");
                host.dispatch_result(&tag, ask.code, names, results);
            }
        })
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
