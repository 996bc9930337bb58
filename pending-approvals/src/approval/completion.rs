//! Completion table
//!
//! Maps each pending request id to the sending half of a single-use channel.
//! The receiving half is handed to the caller as an [`ApprovalHandle`].

use super::error::{ApprovalError, ApprovalResult};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

type Outcome = ApprovalResult<Value>;

#[derive(Default)]
pub struct CompletionTable {
    pending: HashMap<String, oneshot::Sender<Outcome>>,
}

impl CompletionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completion slot for `id` and return the caller's handle.
    ///
    /// The caller must have checked that `id` is not already registered.
    pub fn register(&mut self, id: &str) -> ApprovalHandle {
        let (tx, rx) = oneshot::channel();
        let previous = self.pending.insert(id.to_string(), tx);
        debug_assert!(previous.is_none(), "completion registered twice for {}", id);
        ApprovalHandle {
            id: id.to_string(),
            receiver: rx,
        }
    }

    /// Deliver `outcome` for `id` and drop its slot.
    ///
    /// Returns `None` for an unknown id, otherwise whether a caller was still
    /// waiting to receive the outcome.
    pub fn complete(&mut self, id: &str, outcome: Outcome) -> Option<bool> {
        let sender = self.pending.remove(id)?;
        Some(sender.send(outcome).is_ok())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Deferred outcome of an approval request.
///
/// Resolves to the value passed to `resolve`, or to the error passed to
/// `reject` (`Cleared` after `clear`). If the registry is dropped first the
/// handle yields `RegistryDropped`.
#[derive(Debug)]
pub struct ApprovalHandle {
    id: String,
    receiver: oneshot::Receiver<Outcome>,
}

impl ApprovalHandle {
    /// Id of the request this handle belongs to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Outcome if it has already been delivered, without waiting.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ApprovalError::RegistryDropped)),
        }
    }

    /// Block the current thread until the request completes.
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_wait(self) -> Outcome {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(ApprovalError::RegistryDropped))
    }
}

impl Future for ApprovalHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ApprovalError::RegistryDropped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_complete_delivers_value() {
        let mut table = CompletionTable::new();
        let handle = table.register("foo");
        assert_eq!(table.len(), 1);

        assert_eq!(table.complete("foo", Ok(json!("success"))), Some(true));
        assert!(table.is_empty());
        assert_eq!(handle.await, Ok(json!("success")));
    }

    #[test]
    fn test_complete_unknown_id() {
        let mut table = CompletionTable::new();
        assert_eq!(table.complete("missing", Ok(Value::Null)), None);
    }

    #[test]
    fn test_complete_after_handle_dropped() {
        let mut table = CompletionTable::new();
        drop(table.register("foo"));

        assert_eq!(table.complete("foo", Ok(Value::Null)), Some(false));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_try_outcome_before_and_after() {
        let mut table = CompletionTable::new();
        let mut handle = table.register("foo");
        assert_eq!(handle.try_outcome(), None);

        table.complete("foo", Err(ApprovalError::rejected("failure")));
        assert_eq!(
            handle.try_outcome(),
            Some(Err(ApprovalError::rejected("failure")))
        );
    }

    #[tokio::test]
    async fn test_dropped_table_yields_registry_dropped() {
        let mut table = CompletionTable::new();
        let handle = table.register("foo");
        drop(table);

        assert_eq!(handle.await, Err(ApprovalError::RegistryDropped));
    }
}
