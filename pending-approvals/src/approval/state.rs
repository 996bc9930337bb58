//! Observable approval state
//!
//! The registry exposes its pending set as an [`ApprovalState`] snapshot and
//! pushes a fresh snapshot to every subscriber after each mutation.

use super::types::ApprovalRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Snapshot of every pending request, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalState {
    pub pending_approvals: BTreeMap<String, ApprovalRequest>,
}

impl ApprovalState {
    pub fn new(pending_approvals: BTreeMap<String, ApprovalRequest>) -> Self {
        Self { pending_approvals }
    }

    pub fn is_empty(&self) -> bool {
        self.pending_approvals.is_empty()
    }
}

/// Receives the full state after every mutation.
pub trait StateListener: Send + Sync {
    fn on_state_changed(&self, state: &ApprovalState);
}

impl<F> StateListener for F
where
    F: Fn(&ApprovalState) + Send + Sync,
{
    fn on_state_changed(&self, state: &ApprovalState) {
        self(state)
    }
}

/// Token returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Listeners in registration order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Arc<dyn StateListener>)>,
    /// Revision of the newest state handed to listeners
    last_delivered: u64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn StateListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Hand `state` to every listener in registration order.
    ///
    /// A state older than one already delivered is skipped, so the last
    /// state a listener sees is always the newest. Returns whether it was
    /// delivered.
    pub fn deliver(&mut self, revision: u64, state: &ApprovalState) -> bool {
        if revision <= self.last_delivered {
            return false;
        }
        self.last_delivered = revision;
        for (_, listener) in &self.listeners {
            listener.on_state_changed(state);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_listeners_keep_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::new();

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            subscribers.subscribe(Arc::new(move |_: &ApprovalState| {
                seen.lock().unwrap().push(tag);
            }));
        }

        assert!(subscribers.deliver(1, &ApprovalState::default()));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_stale_revision_is_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::new();
        let recorder = Arc::clone(&seen);
        subscribers.subscribe(Arc::new(move |state: &ApprovalState| {
            recorder.lock().unwrap().push(state.pending_approvals.len());
        }));

        let mut newer = ApprovalState::default();
        newer.pending_approvals.insert(
            "foo".to_string(),
            ApprovalRequest {
                id: "foo".to_string(),
                origin: "bar.baz".to_string(),
                request_type: None,
                request_data: None,
            },
        );

        assert!(subscribers.deliver(2, &newer));
        assert!(!subscribers.deliver(1, &ApprovalState::default()));
        assert!(!subscribers.deliver(2, &ApprovalState::default()));
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut subscribers = Subscribers::new();
        let id = subscribers.subscribe(Arc::new(|_: &ApprovalState| {}));
        let other = subscribers.subscribe(Arc::new(|_: &ApprovalState| {}));

        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        assert_eq!(subscribers.len(), 1);
        assert!(subscribers.unsubscribe(other));
        assert!(subscribers.is_empty());
    }

    #[test]
    fn test_state_serializes_under_pending_approvals() {
        let state = ApprovalState::default();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({ "pendingApprovals": {} })
        );
    }
}
