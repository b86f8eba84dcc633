//! Domain error types
//!
//! This module defines the error hierarchy for the clinic backend. Every
//! service returns a [`ClinicError`]; the API layer owns the single mapping
//! from these variants to HTTP status codes.

use serde::Serialize;
use thiserror::Error;

/// Main clinic error type
#[derive(Debug, Error)]
pub enum ClinicError {
    /// Entity absent by id (or by another unique key)
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Uniqueness violation or scheduling clash
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed or out-of-range input, including past-dated bookings
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Bad credentials or an invalid/expired token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacks the role for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store errors (connection, query, pool)
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Anything else that should surface as an unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicError {
    /// Creates a not-found error for an entity looked up by `key`
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ClinicError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Creates an invalid-request error without field details
    pub fn invalid(message: impl Into<String>) -> Self {
        ClinicError::InvalidRequest {
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    /// Creates a validation error from a list of field errors
    pub fn validation(field_errors: Vec<FieldError>) -> Self {
        ClinicError::InvalidRequest {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }

    /// Returns true for the client-facing taxonomy (not infrastructure failures)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClinicError::NotFound { .. }
                | ClinicError::Conflict(_)
                | ClinicError::InvalidRequest { .. }
                | ClinicError::Unauthorized(_)
                | ClinicError::Forbidden(_)
        )
    }
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Field name as it appears in the request body
    pub field: String,

    /// Human-readable reason
    pub message: String,

    /// The offending value, when it is safe to echo back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
}

impl FieldError {
    /// Creates a field error without echoing the value
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rejected_value: None,
        }
    }

    /// Attaches the rejected value
    pub fn with_value(mut self, value: impl Serialize) -> Self {
        self.rejected_value = serde_json::to_value(value).ok();
        self
    }
}

/// Accumulates field errors and turns them into a single [`ClinicError`]
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    /// Creates an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` when `ok` is false
    pub fn check(&mut self, ok: bool, error: impl FnOnce() -> FieldError) -> &mut Self {
        if !ok {
            self.errors.push(error());
        }
        self
    }

    /// Records a required-text error when `value` is blank
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), || {
            FieldError::new(field, format!("{field} is required"))
        })
    }

    /// Finishes validation
    pub fn finish(&mut self) -> Result<(), ClinicError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ClinicError::validation(std::mem::take(&mut self.errors)))
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        ClinicError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        ClinicError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ClinicError {
    fn from(err: toml::de::Error) -> Self {
        ClinicError::Configuration(format!("TOML parse error: {err}"))
    }
}
