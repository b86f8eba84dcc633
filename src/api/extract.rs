//! Request extractors
//!
//! Wrappers around axum's `Json`, `Query` and `Path` that turn rejections into
//! [`ClinicError::InvalidRequest`] so malformed input gets the same error
//! envelope as a failed validation, plus the authenticated [`Caller`].

use crate::api::AppState;
use crate::domain::{ClinicError, Result, Role, UserId};
use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// JSON request body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ClinicError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection| ClinicError::invalid(rejection.body_text()))
    }
}

/// Query string parameters
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ClinicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection| ClinicError::invalid(rejection.body_text()))
    }
}

/// Path segments
pub struct PathParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ClinicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| PathParams(value))
            .map_err(|rejection| ClinicError::invalid(rejection.body_text()))
    }
}

/// `?start_date=..&end_date=..` for the date-range listings
#[derive(Debug, Deserialize)]
pub struct DateRange {
    #[serde(alias = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "endDate")]
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DiagnosisQuery {
    pub diagnosis: String,
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ClinicError::Unauthorized("Missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| ClinicError::Unauthorized("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ClinicError::Unauthorized("Invalid authorization header".to_string()))
}

/// The authenticated identity behind a request
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Caller {
    /// Fails with `Forbidden` unless the caller holds one of `roles`
    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(
                username = %self.username,
                role = %self.role,
                "Caller lacks the role for this operation"
            );
            Err(ClinicError::Forbidden("Access denied".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        self.require(&[Role::Admin])
    }

    pub fn require_staff(&self) -> Result<()> {
        self.require(&[Role::Admin, Role::Doctor])
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ClinicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.services.auth.authenticate(token)?;
        Ok(Caller {
            id: UserId::new(claims.uid).map_err(ClinicError::Unauthorized)?,
            username: claims.sub,
            role: claims.role,
        })
    }
}
