//! End-to-end behaviour of the Coordinator against the in-memory host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use consent::authority::{AskEvent, MemoryAuthority};
use consent::host::memory::{MemoryHost, MemoryHostConfig};
use consent::{
    CancelReason, Coordinator, CoordinatorConfig, CoordinatorError, DeniedPermission,
    GrantStatus, PermissionName, PermissionOutcome, DEFAULT_CONTAINER_TAG,
};
use tokio::sync::mpsc;

struct Harness {
    host: Arc<MemoryHost>,
    authority: Arc<MemoryAuthority>,
    asks: mpsc::UnboundedReceiver<AskEvent>,
    coordinator: Arc<Coordinator<MemoryHost>>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn harness(host_config: MemoryHostConfig, config: CoordinatorConfig) -> Harness {
    init_tracing();
    let (authority, asks) = MemoryAuthority::channel();
    let authority = Arc::new(authority);
    let host = Arc::new(MemoryHost::with_config(Arc::clone(&authority), host_config));
    let coordinator = Arc::new(Coordinator::new(Arc::clone(&host), config));
    Harness {
        host,
        authority,
        asks,
        coordinator,
    }
}

fn default_harness() -> Harness {
    harness(MemoryHostConfig::default(), CoordinatorConfig::default())
}

impl Harness {
    fn answer(&self, ask: AskEvent, results: Vec<GrantStatus>) {
        assert!(self
            .host
            .dispatch_result(DEFAULT_CONTAINER_TAG, ask.code, ask.names, results));
    }

    fn spawn_request(
        &self,
        names: &'static [&'static str],
    ) -> tokio::task::JoinHandle<consent::Result<PermissionOutcome>> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move { coordinator.request(names.iter().copied()).await })
    }
}

#[tokio::test]
async fn empty_request_is_a_usage_error() {
    let h = default_harness();

    let err = h.coordinator.request(Vec::<&str>::new()).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::EmptyRequest));
    assert!(h.host.container(DEFAULT_CONTAINER_TAG).is_none());
}

#[tokio::test]
async fn granted_immediately_without_dialog() {
    let h = default_harness();
    h.authority.grant("CAMERA");

    let outcome = h.coordinator.request(["CAMERA"]).await.unwrap();

    assert_eq!(outcome, PermissionOutcome::granted(vec!["CAMERA".into()]));
    assert_eq!(h.authority.ask_count(), 0);
}

#[tokio::test]
async fn camera_granted_by_dialog() {
    let mut h = default_harness();
    let request = h.spawn_request(&["CAMERA"]);

    let ask = h.asks.recv().await.unwrap();
    assert!(h.coordinator.is_request_pending().await.unwrap());
    h.answer(ask, vec![GrantStatus::Granted]);

    let outcome = request.await.unwrap().unwrap();
    assert_eq!(outcome, PermissionOutcome::granted(vec!["CAMERA".into()]));
    assert!(!h.coordinator.is_request_pending().await.unwrap());
}

#[tokio::test]
async fn partial_grant_reports_rationale_denial() {
    let mut h = default_harness();
    h.authority.set_rationale("B", true);
    let request = h.spawn_request(&["A", "B"]);

    let ask = h.asks.recv().await.unwrap();
    assert_eq!(ask.names, vec![PermissionName::from("A"), PermissionName::from("B")]);
    h.answer(ask, vec![GrantStatus::Granted, GrantStatus::Denied]);

    let outcome = request.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        PermissionOutcome::denied(
            vec!["A".into()],
            vec![DeniedPermission::NeedsRationale("B".into())]
        )
    );
}

#[tokio::test]
async fn with_permissions_runs_continuation_only_when_granted() {
    let h = default_harness();
    h.authority.grant("A");

    let value = h
        .coordinator
        .with_permissions(["A"], |granted| async move { granted.permissions.len() })
        .await
        .unwrap();
    assert_eq!(value, 1);

    h.authority.set_runtime_requests(false);
    let ran = AtomicBool::new(false);
    let err = h
        .coordinator
        .with_permissions(["A", "B"], |_| {
            ran.store(true, Ordering::SeqCst);
            async {}
        })
        .await
        .unwrap_err();

    assert!(!ran.load(Ordering::SeqCst));
    match err {
        CoordinatorError::RequestFailed { denied } => {
            assert_eq!(denied, vec![PermissionName::from("B")]);
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn is_permissions_granted_is_an_any_check() {
    let h = default_harness();
    h.authority.grant("A");

    assert!(h.coordinator.is_permissions_granted(["A", "B"]).await.unwrap());
    assert!(!h.coordinator.is_permissions_granted(["B"]).await.unwrap());
}

#[tokio::test]
async fn teardown_cancels_pending_request() {
    let mut h = default_harness();
    let request = h.spawn_request(&["A"]);
    h.asks.recv().await.unwrap();

    assert!(h.host.destroy(DEFAULT_CONTAINER_TAG));

    let err = request.await.unwrap().unwrap_err();
    assert!(err.is_cancellation());
    assert!(matches!(err, CoordinatorError::Cancelled(CancelReason::Destroyed)));
}

#[tokio::test]
async fn new_container_is_attached_after_teardown() {
    let h = default_harness();
    h.authority.grant("A");
    h.coordinator.request(["A"]).await.unwrap();
    let first = h.host.container(DEFAULT_CONTAINER_TAG).unwrap();

    h.host.destroy(DEFAULT_CONTAINER_TAG);
    h.coordinator.request(["A"]).await.unwrap();
    let second = h.host.container(DEFAULT_CONTAINER_TAG).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn recreation_keeps_pending_request_and_reasks() {
    let mut h = default_harness();
    let request = h.spawn_request(&["A"]);
    let first = h.asks.recv().await.unwrap();

    assert_eq!(h.host.recreate(), 1);
    let second = h.asks.recv().await.unwrap();
    assert_eq!(first, second);

    h.answer(second, vec![GrantStatus::Granted]);
    assert!(request.await.unwrap().unwrap().is_granted());
}

#[tokio::test]
async fn readiness_timeout_is_reported() {
    let h = harness(
        MemoryHostConfig {
            auto_ready: false,
            ..MemoryHostConfig::default()
        },
        CoordinatorConfig {
            ready_timeout: Some(Duration::from_millis(50)),
            ..CoordinatorConfig::default()
        },
    );

    let err = h.coordinator.request(["A"]).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::Timeout(limit) if limit == Duration::from_millis(50)));
    assert_eq!(h.authority.ask_count(), 0);
}

#[tokio::test]
async fn request_waits_for_readiness() {
    let mut h = harness(
        MemoryHostConfig {
            auto_ready: false,
            ..MemoryHostConfig::default()
        },
        CoordinatorConfig::default(),
    );
    let request = h.spawn_request(&["A"]);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.asks.try_recv().is_err());

    assert!(h.host.ready(DEFAULT_CONTAINER_TAG));
    let ask = h.asks.recv().await.unwrap();
    h.answer(ask, vec![GrantStatus::Denied]);

    let outcome = request.await.unwrap().unwrap();
    assert!(outcome.is_denied());
}

#[tokio::test]
async fn request_waits_for_host_creation() {
    let h = harness(
        MemoryHostConfig {
            created: false,
            ..MemoryHostConfig::default()
        },
        CoordinatorConfig::default(),
    );
    h.authority.grant("A");
    let request = h.spawn_request(&["A"]);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!request.is_finished());

    h.host.mark_created();
    assert!(request.await.unwrap().unwrap().is_granted());
}

#[tokio::test]
async fn independent_coordinators_run_in_parallel() {
    init_tracing();
    let (authority, mut asks) = MemoryAuthority::channel();
    let authority = Arc::new(authority);
    let host = Arc::new(MemoryHost::new(Arc::clone(&authority)));
    let left = Arc::new(Coordinator::new(
        Arc::clone(&host),
        CoordinatorConfig {
            tag: "left".into(),
            ..CoordinatorConfig::default()
        },
    ));
    let right = Arc::new(Coordinator::new(
        Arc::clone(&host),
        CoordinatorConfig {
            tag: "right".into(),
            ..CoordinatorConfig::default()
        },
    ));

    let left_request = {
        let left = Arc::clone(&left);
        tokio::spawn(async move { left.request(["L"]).await })
    };
    let right_request = {
        let right = Arc::clone(&right);
        tokio::spawn(async move { right.request(["R"]).await })
    };

    // Both dialogs are outstanding at once.
    let mut seen = vec![asks.recv().await.unwrap(), asks.recv().await.unwrap()];
    seen.sort_by(|a, b| a.names.cmp(&b.names));
    assert_eq!(seen[0].names, vec![PermissionName::from("L")]);
    assert_eq!(seen[1].names, vec![PermissionName::from("R")]);

    host.dispatch_result("right", seen[1].code, seen[1].names.clone(), vec![GrantStatus::Granted]);
    assert!(right_request.await.unwrap().unwrap().is_granted());
    assert!(left.is_request_pending().await.unwrap());

    host.dispatch_result("left", seen[0].code, seen[0].names.clone(), vec![GrantStatus::Denied]);
    assert!(left_request.await.unwrap().unwrap().is_denied());
}
