//! `/api/users`

use crate::api::extract::{Caller, JsonBody, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{ClinicError, Identity, IdentityUpdate, NewIdentity, Page, PageRequest, Role, UserId};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/role/:role", get(by_role))
        .route("/username/:username", get(by_username))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    caller: Caller,
    QueryParams(request): QueryParams<PageRequest>,
) -> ApiResult<Page<Identity>> {
    caller.require_admin()?;
    Ok(ApiResponse::ok(state.services.users.list(request).await?))
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(candidate): JsonBody<NewIdentity>,
) -> ApiResult<Identity> {
    caller.require_admin()?;
    let identity = state.services.auth.register(candidate).await?;
    Ok(ApiResponse::with_message("User created successfully", identity))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<Identity> {
    Ok(ApiResponse::ok(state.services.users.get(id).await?))
}

async fn by_username(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(username): PathParams<String>,
) -> ApiResult<Identity> {
    Ok(ApiResponse::ok(
        state.services.users.get_by_username(&username).await?,
    ))
}

async fn search(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(query): QueryParams<NameQuery>,
) -> ApiResult<Vec<Identity>> {
    Ok(ApiResponse::ok(state.services.users.search(&query.name).await?))
}

async fn by_role(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(role): PathParams<Role>,
) -> ApiResult<Vec<Identity>> {
    Ok(ApiResponse::ok(state.services.users.list_by_role(role).await?))
}

/// Administrators edit anyone; everyone else only themselves
async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
    JsonBody(update): JsonBody<IdentityUpdate>,
) -> ApiResult<Identity> {
    if caller.role != Role::Admin && caller.id != id {
        return Err(ClinicError::Forbidden(
            "Users may only update their own profile".to_string(),
        ));
    }
    let identity = state.services.users.update(id, update).await?;
    Ok(ApiResponse::with_message("User updated successfully", identity))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<()> {
    caller.require_admin()?;
    state.services.users.delete(id).await?;
    Ok(ApiResponse::done("User deleted successfully"))
}
