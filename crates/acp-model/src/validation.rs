//! Field validation for ACP request payloads.
//!
//! Validation stops at the first violation. The offending field is reported
//! as a JSON path so clients can highlight it.

use std::fmt;

use acp_core::{AcpError, ErrorCode};

/// A single field constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    path: String,
    reason: String,
}

impl ValidationError {
    /// Create a violation for the field at `path` (dotted, without `$.`).
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Dotted field path, e.g. `items[0].quantity`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// JSONPath of the field, e.g. `$.items[0].quantity`.
    #[must_use]
    pub fn param(&self) -> String {
        format!("$.{}", self.path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.reason)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for AcpError {
    fn from(err: ValidationError) -> Self {
        AcpError::invalid_request(ErrorCode::InvalidRequest, err.to_string())
            .with_param(err.param())
    }
}

/// Schema constraints beyond what deserialization enforces.
pub trait Validate {
    /// Returns the first violated constraint, if any.
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn required(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(path, "is required"));
    }
    Ok(())
}

pub(crate) fn exact_len(path: &str, value: &str, len: usize) -> Result<(), ValidationError> {
    if value.chars().count() != len {
        return Err(ValidationError::new(
            path,
            format!("must be exactly {len} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn max_len(path: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            path,
            format!("cannot exceed {max} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn numeric(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new(path, "must contain digits only"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_path_and_param() {
        let err = ValidationError::new("items[0].id", "is required");
        assert_eq!(err.to_string(), "items[0].id is required");
        assert_eq!(err.param(), "$.items[0].id");
    }

    #[test]
    fn test_should_convert_into_invalid_request() {
        let err: AcpError = ValidationError::new("allowance.max_amount", "must be greater than 0").into();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.param.as_deref(), Some("$.allowance.max_amount"));
    }

    #[test]
    fn test_should_count_characters_not_bytes() {
        assert!(exact_len("x", "ééé", 3).is_ok());
        assert!(max_len("x", "1234567", 6).is_err());
        assert!(numeric("x", "12a").is_err());
        assert!(numeric("x", "").is_err());
    }
}
