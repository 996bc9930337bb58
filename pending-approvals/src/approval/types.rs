//! Approval request types
//!
//! This module defines the request shape stored by the registry, the
//! descriptor callers pass to `add`, the membership queries accepted by
//! `has`, and the display hook the host supplies at construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved type used for requests added without an explicit type.
pub const DEFAULT_APPROVAL_TYPE: &str = "_default";

/// A pending approval request as exposed to observers.
///
/// The completion handle is never part of this value; it stays inside the
/// registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: String,
    pub origin: String,
    /// Caller-chosen category. `None` means the reserved default type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    /// Opaque payload, never interpreted by the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl ApprovalRequest {
    /// Type used for uniqueness checks, falling back to `default_type`.
    pub fn effective_type<'a>(&'a self, default_type: &'a str) -> &'a str {
        self.request_type.as_deref().unwrap_or(default_type)
    }
}

/// Descriptor passed to `add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddApprovalOptions {
    /// Generated by the registry when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub origin: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl AddApprovalOptions {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    pub fn with_request_data(mut self, request_data: Value) -> Self {
        self.request_data = Some(request_data);
        self
    }
}

/// Membership query accepted by `ApprovalRegistry::has`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalQuery {
    /// A pending request with this id exists
    Id(String),
    /// The origin has at least one pending request, of any type
    Origin(String),
    /// The origin has a pending request of exactly this type
    OriginType {
        origin: String,
        request_type: String,
    },
}

impl ApprovalQuery {
    pub fn id(id: impl Into<String>) -> Self {
        ApprovalQuery::Id(id.into())
    }

    pub fn origin(origin: impl Into<String>) -> Self {
        ApprovalQuery::Origin(origin.into())
    }

    pub fn origin_type(origin: impl Into<String>, request_type: impl Into<String>) -> Self {
        ApprovalQuery::OriginType {
            origin: origin.into(),
            request_type: request_type.into(),
        }
    }
}

/// Hook invoked when a request should be surfaced to the gatekeeper.
///
/// Owned by the host. The registry calls it fire-and-forget: nothing it does
/// feeds back into the request lifecycle.
pub trait ApprovalDisplay: Send + Sync {
    fn show(&self, request: &ApprovalRequest);
}

impl<F> ApprovalDisplay for F
where
    F: Fn(&ApprovalRequest) + Send + Sync,
{
    fn show(&self, request: &ApprovalRequest) {
        self(request)
    }
}

/// Display hook for hosts that never surface requests through the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDisplay;

impl ApprovalDisplay for NoopDisplay {
    fn show(&self, _request: &ApprovalRequest) {}
}
