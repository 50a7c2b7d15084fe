//! The single in-flight request slot.

use std::collections::HashSet;

use consent_core::{CancelReason, GrantStatus, PermissionName, RequestError, Result};
use tokio::sync::oneshot;

/// Per-name statuses delivered by the host's callback.
pub(crate) type AskResults = Vec<(PermissionName, GrantStatus)>;

/// The ask a container is waiting on.
///
/// Holds the names handed to the consent dialog and a single-assignment
/// completion handle. Once the handle is consumed the state is no longer
/// pending, even if it still sits in the slot.
#[derive(Debug)]
pub struct RequestState {
    id: u64,
    permissions: Vec<PermissionName>,
    completion: Option<oneshot::Sender<Result<AskResults>>>,
}

impl RequestState {
    pub(crate) fn new(
        id: u64,
        permissions: Vec<PermissionName>,
    ) -> (Self, oneshot::Receiver<Result<AskResults>>) {
        let (tx, rx) = oneshot::channel();
        let state = Self {
            id,
            permissions,
            completion: Some(tx),
        };
        (state, rx)
    }

    /// Generation of this state within its container.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Names handed to the consent dialog.
    pub fn permissions(&self) -> &[PermissionName] {
        &self.permissions
    }

    /// Whether the completion handle is unconsumed and someone still awaits it.
    pub fn is_pending(&self) -> bool {
        self.completion
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Whether `names` holds exactly this state's permissions, ignoring order.
    pub(crate) fn matches(&self, names: &[PermissionName]) -> bool {
        let ours: HashSet<&PermissionName> = self.permissions.iter().collect();
        let theirs: HashSet<&PermissionName> = names.iter().collect();
        ours == theirs
    }

    /// Resolve with the host's answer. Returns false if already resolved.
    pub(crate) fn complete(&mut self, results: AskResults) -> bool {
        match self.completion.take() {
            Some(tx) => tx.send(Ok(results)).is_ok(),
            None => false,
        }
    }

    /// Resolve with an error. Returns false if already resolved.
    pub(crate) fn fail(&mut self, error: RequestError) -> bool {
        match self.completion.take() {
            Some(tx) => tx.send(Err(error)).is_ok(),
            None => false,
        }
    }
}

/// Install `next` in `slot`.
///
/// An unresolved previous state is failed with
/// [`CancelReason::Superseded`] first; it is never silently dropped.
/// Returns the previous state.
pub(crate) fn replace_state(
    slot: &mut Option<RequestState>,
    next: Option<RequestState>,
) -> Option<RequestState> {
    if let Some(previous) = slot.as_mut().filter(|s| s.is_pending()) {
        let reason = CancelReason::Superseded {
            previous: previous.permissions.clone(),
            next: next
                .as_ref()
                .map(|n| n.permissions.clone())
                .unwrap_or_default(),
        };
        tracing::warn!(%reason, "superseding unresolved permission request");
        previous.fail(RequestError::Cancelled(reason));
    }
    std::mem::replace(slot, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<PermissionName> {
        raw.iter().map(|n| PermissionName::from(*n)).collect()
    }

    #[tokio::test]
    async fn test_complete_is_single_assignment() {
        let (mut state, rx) = RequestState::new(1, names(&["A"]));
        assert!(state.is_pending());

        assert!(state.complete(vec![("A".into(), GrantStatus::Granted)]));
        assert!(!state.is_pending());
        assert!(!state.fail(RequestError::Correlation("late".into())));

        let results = rx.await.unwrap().unwrap();
        assert_eq!(results, vec![(PermissionName::from("A"), GrantStatus::Granted)]);
    }

    #[test]
    fn test_dropped_receiver_is_not_pending() {
        let (state, rx) = RequestState::new(1, names(&["A"]));
        drop(rx);
        assert!(!state.is_pending());
    }

    #[test]
    fn test_matches_ignores_order() {
        let (state, _rx) = RequestState::new(1, names(&["A", "B"]));
        assert!(state.matches(&names(&["B", "A"])));
        assert!(!state.matches(&names(&["A"])));
        assert!(!state.matches(&names(&["A", "C"])));
    }

    #[tokio::test]
    async fn test_replace_fails_unresolved_previous() {
        let mut slot = None;
        let (first, first_rx) = RequestState::new(1, names(&["X"]));
        let (second, _second_rx) = RequestState::new(2, names(&["Y"]));

        assert!(replace_state(&mut slot, Some(first)).is_none());
        let previous = replace_state(&mut slot, Some(second)).unwrap();
        assert_eq!(previous.id(), 1);
        assert_eq!(slot.as_ref().map(RequestState::id), Some(2));

        let err = first_rx.await.unwrap().unwrap_err();
        match err.cancel_reason() {
            Some(CancelReason::Superseded { previous, next }) => {
                assert_eq!(previous, &names(&["X"]));
                assert_eq!(next, &names(&["Y"]));
            }
            other => panic!("expected superseded cancellation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replace_leaves_resolved_previous_alone() {
        let mut slot = None;
        let (mut first, first_rx) = RequestState::new(1, names(&["X"]));
        first.complete(vec![("X".into(), GrantStatus::Denied)]);
        replace_state(&mut slot, Some(first));

        replace_state(&mut slot, None);

        let results = first_rx.await.unwrap().unwrap();
        assert_eq!(results[0].1, GrantStatus::Denied);
    }
}
