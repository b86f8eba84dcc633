//! Response envelopes and the error-to-status mapping
//!
//! Every handler returns [`ApiResult`]. Success bodies are wrapped in
//! [`ApiResponse`]; every [`ClinicError`] becomes an [`ErrorEnvelope`] with the
//! status code chosen in [`status_of`]. The request path is filled in by the
//! [`attach_error_path`] middleware since `IntoResponse` never sees the request.

use crate::domain::{ClinicError, FieldError};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub type ApiResult<T> = std::result::Result<ApiResponse<T>, ClinicError>;

const UNEXPECTED: &str = "An unexpected error occurred";

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_message("Operation completed successfully", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
            timestamp: Utc::now(),
            path: None,
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload, for deletes
    pub fn done(message: impl Into<String>) -> Self {
        Self::with_message(message, ())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<FieldError>>,
}

/// HTTP status for each error variant
pub fn status_of(error: &ClinicError) -> StatusCode {
    match error {
        ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClinicError::Conflict(_) | ClinicError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        ClinicError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ClinicError::Forbidden(_) => StatusCode::FORBIDDEN,
        ClinicError::Configuration(_)
        | ClinicError::Database(_)
        | ClinicError::Serialization(_)
        | ClinicError::Io(_)
        | ClinicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ErrorEnvelope {
    pub fn from_error(error: ClinicError) -> Self {
        let status = status_of(&error);
        if error.is_client_error() {
            tracing::debug!(error = %error, status = status.as_u16(), "Request rejected");
        }
        let (label, message, validation_errors) = match error {
            ClinicError::InvalidRequest {
                message,
                field_errors,
            } if !field_errors.is_empty() => ("Validation Error", message, Some(field_errors)),
            ClinicError::InvalidRequest { message, .. } => ("Bad Request", message, None),
            ClinicError::Conflict(message)
            | ClinicError::Unauthorized(message)
            | ClinicError::Forbidden(message) => (reason(status), message, None),
            not_found @ ClinicError::NotFound { .. } => ("Not Found", not_found.to_string(), None),
            internal => {
                crate::log_error_with_context!(internal, "Request failed");
                (reason(status), UNEXPECTED.to_string(), None)
            }
        };

        Self {
            status: status.as_u16(),
            error: label.to_string(),
            message,
            timestamp: Utc::now(),
            path: String::new(),
            validation_errors,
        }
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Error")
}

impl IntoResponse for ClinicError {
    fn into_response(self) -> Response {
        ErrorEnvelope::from_error(self).into_response()
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.clone())).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Rewrites error envelopes with the path of the request that produced them
pub async fn attach_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorEnvelope>() {
        Some(mut envelope) => {
            envelope.path = path;
            envelope.into_response()
        }
        None => response,
    }
}
