//! Pending approval registry.
//!
//! This module tracks outstanding approval requests, enforces id and
//! (origin, type) uniqueness, and hands each caller a deferred handle that
//! completes when the gatekeeper resolves or rejects the request.

pub mod completion;
pub mod error;
pub mod registry;
pub mod state;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use completion::ApprovalHandle;
pub use error::{ApprovalError, ApprovalErrorKind, ApprovalResult};
pub use registry::ApprovalRegistry;
pub use state::{ApprovalState, StateListener, SubscriptionId};
pub use types::*;
