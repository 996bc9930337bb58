//! Error taxonomy for approval requests.
//!
//! `ApprovalError` is returned synchronously by registry operations and is
//! also the failure delivered through a pending request's handle.

use crate::config::ErrorCodes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Errors raised by the registry or delivered to a waiting caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApprovalError {
    #[error("Must specify non-empty string origin.")]
    OriginRequired,

    #[error("Must specify non-empty string id.")]
    InvalidId,

    #[error("Must specify non-empty string type.")]
    InvalidType,

    #[error("Approval with id '{id}' already exists.")]
    IdCollision { id: String },

    #[error("Request{} already pending for origin {origin}. Please wait.", type_clause(.request_type))]
    OriginTypeCollision {
        origin: String,
        /// `None` when the colliding request used the default type
        request_type: Option<String>,
    },

    #[error("Approval with id '{id}' not found.")]
    IdNotFound { id: String },

    /// Rejection delivered by `clear()`
    #[error("The approval request was cleared.")]
    Cleared,

    /// Rejection supplied by the gatekeeper through `reject()`
    #[error("{message}")]
    Rejected {
        message: String,
        code: Option<i64>,
        data: Option<Value>,
    },

    /// The registry was discarded while the request was still pending
    #[error("The approval registry was dropped before the request completed.")]
    RegistryDropped,
}

fn type_clause(request_type: &Option<String>) -> String {
    match request_type {
        Some(t) => format!(" of type '{}'", t),
        None => String::new(),
    }
}

impl ApprovalError {
    /// Gatekeeper rejection carrying only a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        ApprovalError::Rejected {
            message: message.into(),
            code: None,
            data: None,
        }
    }

    /// Gatekeeper rejection carrying a host-level code.
    pub fn rejected_with_code(message: impl Into<String>, code: i64) -> Self {
        ApprovalError::Rejected {
            message: message.into(),
            code: Some(code),
            data: None,
        }
    }

    pub fn kind(&self) -> ApprovalErrorKind {
        match self {
            ApprovalError::OriginRequired => ApprovalErrorKind::OriginRequired,
            ApprovalError::InvalidId => ApprovalErrorKind::InvalidId,
            ApprovalError::InvalidType => ApprovalErrorKind::InvalidType,
            ApprovalError::IdCollision { .. } => ApprovalErrorKind::IdCollision,
            ApprovalError::OriginTypeCollision { .. } => ApprovalErrorKind::OriginTypeCollision,
            ApprovalError::IdNotFound { .. } => ApprovalErrorKind::IdNotFound,
            ApprovalError::Cleared => ApprovalErrorKind::Cleared,
            ApprovalError::Rejected { .. } => ApprovalErrorKind::Rejected,
            ApprovalError::RegistryDropped => ApprovalErrorKind::RegistryDropped,
        }
    }

    /// Numeric code for this error under the host's code table.
    ///
    /// A gatekeeper rejection keeps the code it was created with.
    pub fn code(&self, codes: &ErrorCodes) -> Option<i64> {
        match self {
            ApprovalError::Rejected { code, .. } => *code,
            other => codes.for_kind(other.kind()),
        }
    }
}

/// Machine-checkable error kind with a stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalErrorKind {
    OriginRequired,
    InvalidId,
    InvalidType,
    IdCollision,
    OriginTypeCollision,
    IdNotFound,
    Cleared,
    Rejected,
    RegistryDropped,
}

impl ApprovalErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalErrorKind::OriginRequired => "origin_required",
            ApprovalErrorKind::InvalidId => "invalid_id",
            ApprovalErrorKind::InvalidType => "invalid_type",
            ApprovalErrorKind::IdCollision => "id_collision",
            ApprovalErrorKind::OriginTypeCollision => "origin_type_collision",
            ApprovalErrorKind::IdNotFound => "id_not_found",
            ApprovalErrorKind::Cleared => "cleared",
            ApprovalErrorKind::Rejected => "rejected",
            ApprovalErrorKind::RegistryDropped => "registry_dropped",
        }
    }
}

impl fmt::Display for ApprovalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
