//! Service-level errors.
//!
//! Store implementations return [`StoreError`]; the services in `accounting`, `banking`,
//! `sales`, `hrm` and `devices` return [`ErpError`], which keeps user-facing validation
//! failures apart from infrastructure failures.

use crate::accounting::posting::PostingError;
use crate::devices::DeviceError;
use crate::executor::StoreError;
use std::fmt;

/// A rule violation reported back to the user, optionally tied to one input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Option<&'static str>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum ErpError {
    Validation(ValidationError),
    NotFound { entity: &'static str, key: String },
    Posting(PostingError),
    Store(StoreError),
    Device(DeviceError),
    Export(String),
    Config(String),
}

impl ErpError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        ErpError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ErpError::Validation(ValidationError::field(field, message))
    }

    /// The validation failure, if this error is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ErpError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ErpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErpError::Validation(e) => write!(f, "Validation failed: {e}"),
            ErpError::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            ErpError::Posting(e) => write!(f, "Posting failed: {e}"),
            ErpError::Store(e) => write!(f, "{e}"),
            ErpError::Device(e) => write!(f, "Device error: {e}"),
            ErpError::Export(s) => write!(f, "Export failed: {s}"),
            ErpError::Config(s) => write!(f, "Configuration error: {s}"),
        }
    }
}

impl std::error::Error for ErpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErpError::Validation(e) => Some(e),
            ErpError::Posting(e) => Some(e),
            ErpError::Store(e) => Some(e),
            ErpError::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for ErpError {
    fn from(err: ValidationError) -> Self {
        ErpError::Validation(err)
    }
}

impl From<StoreError> for ErpError {
    fn from(err: StoreError) -> Self {
        ErpError::Store(err)
    }
}

impl From<PostingError> for ErpError {
    fn from(err: PostingError) -> Self {
        ErpError::Posting(err)
    }
}

impl From<DeviceError> for ErpError {
    fn from(err: DeviceError) -> Self {
        ErpError::Device(err)
    }
}

impl From<config::ConfigError> for ErpError {
    fn from(err: config::ConfigError) -> Self {
        ErpError::Config(err.to_string())
    }
}

impl From<csv::Error> for ErpError {
    fn from(err: csv::Error) -> Self {
        ErpError::Export(err.to_string())
    }
}

pub type ErpResult<T> = Result<T, ErpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::field("amount", "must be positive");
        assert_eq!(err.to_string(), "amount: must be positive");
        assert_eq!(ValidationError::new("bad").to_string(), "bad");
    }

    #[test]
    fn test_erp_error_display() {
        let err = ErpError::not_found("journal entry", "JE-000001");
        assert_eq!(err.to_string(), "journal entry not found: JE-000001");

        let err: ErpError = StoreError::Conflict("doc_num".into()).into();
        assert!(err.to_string().contains("Constraint violation"));

        let err = ErpError::invalid("doc_num", "already exists");
        assert_eq!(
            err.as_validation().map(|v| v.field),
            Some(Some("doc_num"))
        );
    }
}
