//! Approval Registry
//!
//! Coordinates the request store and the completion table behind a single
//! lock so that every check-then-mutate sequence is atomic. Subscribers and
//! the display hook are invoked after that lock is released, so both may
//! read the registry. Subscribers are called while state delivery is
//! serialized and must not mutate the registry or change subscriptions from
//! inside the callback.

use super::completion::{ApprovalHandle, CompletionTable};
use super::error::{ApprovalError, ApprovalResult};
use super::state::{ApprovalState, StateListener, Subscribers, SubscriptionId};
use super::store::ApprovalStore;
use super::types::{AddApprovalOptions, ApprovalDisplay, ApprovalQuery, ApprovalRequest};
use crate::config::{ApprovalConfig, ConfigError};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Store and completion table, kept in lock-step.
struct PendingApprovals {
    store: ApprovalStore,
    completions: CompletionTable,
    /// Bumped on every mutation; orders snapshots handed to subscribers
    revision: u64,
}

impl PendingApprovals {
    fn snapshot(&self) -> ApprovalState {
        ApprovalState::new(self.store.snapshot())
    }

    /// Snapshot after a mutation, stamped with the next revision.
    fn publish(&mut self) -> (u64, ApprovalState) {
        self.revision += 1;
        (self.revision, self.snapshot())
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.store.has_id(&id) {
                return id;
            }
        }
    }
}

/// Registry of approval requests awaiting a gatekeeper decision.
///
/// Construct one per host session and share it through an `Arc`.
pub struct ApprovalRegistry {
    pending: Mutex<PendingApprovals>,
    subscribers: Mutex<Subscribers>,
    display: Arc<dyn ApprovalDisplay>,
    config: ApprovalConfig,
}

impl ApprovalRegistry {
    /// Create a registry with the default configuration
    pub fn new(display: impl ApprovalDisplay + 'static) -> Self {
        Self::build(Arc::new(display), ApprovalConfig::default())
    }

    /// Create a registry with an explicit configuration
    pub fn with_config(
        display: impl ApprovalDisplay + 'static,
        config: ApprovalConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(Arc::new(display), config))
    }

    fn build(display: Arc<dyn ApprovalDisplay>, config: ApprovalConfig) -> Self {
        Self {
            pending: Mutex::new(PendingApprovals {
                store: ApprovalStore::new(config.default_type.clone()),
                completions: CompletionTable::new(),
                revision: 0,
            }),
            subscribers: Mutex::new(Subscribers::new()),
            display,
            config,
        }
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    // Critical sections never leave the store and completion table out of
    // step, so a poisoned lock still guards consistent data.
    fn lock_pending(&self) -> MutexGuard<'_, PendingApprovals> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Adding requests
    // ========================================================================

    /// Add a pending approval request.
    ///
    /// Fails without changing state when validation or a uniqueness check
    /// fails. On success the returned handle completes once the request is
    /// resolved, rejected or cleared.
    pub fn add(&self, options: AddApprovalOptions) -> ApprovalResult<ApprovalHandle> {
        let (_, handle, (revision, state)) = self.insert(options)?;
        self.notify(revision, &state);
        Ok(handle)
    }

    /// Add a pending approval request and show it through the display hook.
    ///
    /// The hook runs once, synchronously, after the request is stored and
    /// before the handle is returned.
    pub fn add_and_show_approval_request(
        &self,
        options: AddApprovalOptions,
    ) -> ApprovalResult<ApprovalHandle> {
        let (request, handle, (revision, state)) = self.insert(options)?;
        self.notify(revision, &state);
        self.display.show(&request);
        Ok(handle)
    }

    fn insert(
        &self,
        options: AddApprovalOptions,
    ) -> ApprovalResult<(ApprovalRequest, ApprovalHandle, (u64, ApprovalState))> {
        validate_add_options(&options)?;

        let mut pending = self.lock_pending();
        let id = match options.id {
            Some(id) => id,
            None => pending.fresh_id(),
        };
        let request = ApprovalRequest {
            id,
            origin: options.origin,
            request_type: options.request_type,
            request_data: options.request_data,
        };

        pending.store.insert(request.clone())?;
        let handle = pending.completions.register(&request.id);
        debug_assert_eq!(pending.store.len(), pending.completions.len());

        log::debug!(
            "Added approval request {} from origin {} (type {})",
            request.id,
            request.origin,
            request.effective_type(&self.config.default_type)
        );
        let published = pending.publish();
        Ok((request, handle, published))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get a pending request by id
    pub fn get(&self, id: &str) -> Option<ApprovalRequest> {
        self.lock_pending().store.get(id).cloned()
    }

    /// Check whether a matching request is pending
    pub fn has(&self, query: &ApprovalQuery) -> bool {
        let pending = self.lock_pending();
        match query {
            ApprovalQuery::Id(id) => pending.store.has_id(id),
            ApprovalQuery::Origin(origin) => pending.store.has_origin(origin),
            ApprovalQuery::OriginType {
                origin,
                request_type,
            } => pending.store.has_origin_type(origin, request_type),
        }
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.lock_pending().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_pending().store.is_empty()
    }

    /// Current observable state
    pub fn state(&self) -> ApprovalState {
        self.lock_pending().snapshot()
    }

    // ========================================================================
    // Completing requests
    // ========================================================================

    /// Resolve a pending request, completing its handle with `value`.
    pub fn resolve(&self, id: &str, value: Value) -> ApprovalResult<()> {
        self.complete(id, Ok(value))
    }

    /// Reject a pending request, completing its handle with `error`.
    pub fn reject(&self, id: &str, error: ApprovalError) -> ApprovalResult<()> {
        self.complete(id, Err(error))
    }

    fn complete(&self, id: &str, outcome: ApprovalResult<Value>) -> ApprovalResult<()> {
        let (revision, state) = {
            let mut pending = self.lock_pending();
            if pending.store.remove(id).is_none() {
                return Err(ApprovalError::IdNotFound { id: id.to_string() });
            }
            let resolved = outcome.is_ok();
            match pending.completions.complete(id, outcome) {
                Some(true) => log::debug!(
                    "Approval request {} {}",
                    id,
                    if resolved { "resolved" } else { "rejected" }
                ),
                Some(false) => log::warn!(
                    "Approval request {} completed but its caller is no longer waiting",
                    id
                ),
                None => log::error!("Approval request {} had no completion handle", id),
            }
            debug_assert_eq!(pending.store.len(), pending.completions.len());
            pending.publish()
        };

        self.notify(revision, &state);
        Ok(())
    }

    /// Reject every pending request with `Cleared` and empty the registry.
    ///
    /// Returns the number of requests that were rejected. Clearing an empty
    /// registry does nothing and does not notify subscribers.
    pub fn clear(&self) -> usize {
        let (cleared, (revision, state)) = {
            let mut pending = self.lock_pending();
            if pending.store.is_empty() {
                return 0;
            }

            let drained = pending.store.drain();
            for request in &drained {
                if pending
                    .completions
                    .complete(&request.id, Err(ApprovalError::Cleared))
                    == Some(false)
                {
                    log::debug!(
                        "Cleared approval request {} had no waiting caller",
                        request.id
                    );
                }
            }
            debug_assert!(pending.completions.is_empty());
            (drained.len(), pending.publish())
        };

        log::info!("Cleared {} pending approval request(s)", cleared);
        self.notify(revision, &state);
        cleared
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a listener for state changes
    pub fn subscribe(&self, listener: impl StateListener + 'static) -> SubscriptionId {
        self.lock_subscribers().subscribe(Arc::new(listener))
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_subscribers().unsubscribe(id)
    }

    // Delivery holds the subscribers lock, so snapshots reach listeners in
    // revision order and one that lost the race to a newer one is dropped.
    fn notify(&self, revision: u64, state: &ApprovalState) {
        if !self.lock_subscribers().deliver(revision, state) {
            log::debug!("Skipped stale approval state revision {}", revision);
        }
    }
}

fn validate_add_options(options: &AddApprovalOptions) -> ApprovalResult<()> {
    if matches!(options.id.as_deref(), Some("")) {
        return Err(ApprovalError::InvalidId);
    }
    if options.origin.is_empty() {
        return Err(ApprovalError::OriginRequired);
    }
    if matches!(options.request_type.as_deref(), Some("")) {
        return Err(ApprovalError::InvalidType);
    }
    Ok(())
}
