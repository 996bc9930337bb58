// Pending Approvals
// Tracks approval requests awaiting a gatekeeper decision and hands each
// requester a deferred handle for the outcome.

pub mod approval;
pub mod config;

pub use approval::{
    AddApprovalOptions, ApprovalDisplay, ApprovalError, ApprovalErrorKind, ApprovalHandle,
    ApprovalQuery, ApprovalRegistry, ApprovalRequest, ApprovalResult, ApprovalState, NoopDisplay,
    StateListener, SubscriptionId, DEFAULT_APPROVAL_TYPE,
};
pub use config::{ApprovalConfig, ConfigError, ErrorCodes};
