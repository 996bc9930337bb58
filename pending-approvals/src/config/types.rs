use crate::approval::error::ApprovalErrorKind;
use crate::approval::types::DEFAULT_APPROVAL_TYPE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// JSON-RPC "internal error"
pub const RPC_INTERNAL: i64 = -32603;
/// JSON-RPC "resource unavailable"
pub const RPC_RESOURCE_UNAVAILABLE: i64 = -32002;
/// Provider "user rejected request"
pub const PROVIDER_USER_REJECTED: i64 = 4001;

/// Configuration for an approval registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Type assigned to requests that do not name one
    #[serde(default = "default_type")]
    pub default_type: String,
    /// Host-level numeric codes attached to registry errors
    #[serde(default)]
    pub error_codes: ErrorCodes,
}

fn default_type() -> String {
    DEFAULT_APPROVAL_TYPE.to_string()
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            default_type: default_type(),
            error_codes: ErrorCodes::default(),
        }
    }
}

impl ApprovalConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ApprovalConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!(
                "Approval config {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_type must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }
}

/// Numeric code per error kind. `None` leaves the kind without a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorCodes {
    pub origin_required: Option<i64>,
    pub invalid_id: Option<i64>,
    pub invalid_type: Option<i64>,
    pub id_collision: Option<i64>,
    pub origin_type_collision: Option<i64>,
    pub id_not_found: Option<i64>,
    pub cleared: Option<i64>,
}

impl Default for ErrorCodes {
    fn default() -> Self {
        Self {
            origin_required: Some(RPC_INTERNAL),
            invalid_id: Some(RPC_INTERNAL),
            invalid_type: Some(RPC_INTERNAL),
            id_collision: Some(RPC_INTERNAL),
            origin_type_collision: Some(RPC_RESOURCE_UNAVAILABLE),
            id_not_found: None,
            cleared: Some(PROVIDER_USER_REJECTED),
        }
    }
}

impl ErrorCodes {
    pub fn for_kind(&self, kind: ApprovalErrorKind) -> Option<i64> {
        match kind {
            ApprovalErrorKind::OriginRequired => self.origin_required,
            ApprovalErrorKind::InvalidId => self.invalid_id,
            ApprovalErrorKind::InvalidType => self.invalid_type,
            ApprovalErrorKind::IdCollision => self.id_collision,
            ApprovalErrorKind::OriginTypeCollision => self.origin_type_collision,
            ApprovalErrorKind::IdNotFound => self.id_not_found,
            ApprovalErrorKind::Cleared => self.cleared,
            // carry their own code, or none at all
            ApprovalErrorKind::Rejected | ApprovalErrorKind::RegistryDropped => None,
        }
    }
}

/// Error type for loading approval configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ApprovalConfig::from_toml_str("").unwrap();
        assert_eq!(config, ApprovalConfig::default());
        assert_eq!(config.default_type, "_default");
    }

    #[test]
    fn test_partial_error_codes() {
        let config = ApprovalConfig::from_toml_str(
            r#"
default_type = "prompt"

[error_codes]
id_not_found = -32601
"#,
        )
        .unwrap();

        assert_eq!(config.default_type, "prompt");
        assert_eq!(config.error_codes.id_not_found, Some(-32601));
        // untouched keys keep their defaults
        assert_eq!(config.error_codes.id_collision, Some(RPC_INTERNAL));
    }

    #[test]
    fn test_blank_default_type_is_rejected() {
        let err = ApprovalConfig::from_toml_str("default_type = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ApprovalConfig::from_toml_str("default_type = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_and_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approvals.toml");
        assert_eq!(
            ApprovalConfig::load(&path).unwrap(),
            ApprovalConfig::default()
        );

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[error_codes]\ncleared = 4100").unwrap();
        drop(file);

        let config = ApprovalConfig::load(&path).unwrap();
        assert_eq!(config.error_codes.cleared, Some(4100));
    }
}
