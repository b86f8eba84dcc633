//! `/api/auth`: registration, login and token validation

use crate::api::extract::{bearer_token, Caller, JsonBody};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::core::auth::LoginResponse;
use crate::domain::{ClinicError, Identity, NewIdentity, Role};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub valid: bool,
    pub username: String,
    pub role: Role,
    pub user_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/validate", post(validate))
}

/// Open registration; only an administrator may create another administrator
async fn register(
    State(state): State<AppState>,
    caller: Option<Caller>,
    JsonBody(candidate): JsonBody<NewIdentity>,
) -> ApiResult<Identity> {
    if candidate.role == Role::Admin {
        match caller {
            Some(caller) => caller.require_admin()?,
            None => {
                return Err(ClinicError::Forbidden(
                    "Administrator accounts can only be created by an administrator".to_string(),
                ))
            }
        }
    }

    let identity = state.services.auth.register(candidate).await?;
    Ok(ApiResponse::with_message("User registered successfully", identity))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;
    Ok(ApiResponse::with_message("Login successful", response))
}

async fn validate(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<TokenStatus> {
    let claims = state.services.auth.validate(bearer_token(&headers)?).await?;
    Ok(ApiResponse::with_message(
        "Token is valid",
        TokenStatus {
            valid: true,
            username: claims.sub,
            role: claims.role,
            user_id: claims.uid,
        },
    ))
}
