use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    Ok(ApiResponse::ok(Health {
        status: "UP",
        backend: state.backend,
        version: env!("CARGO_PKG_VERSION"),
    }))
}
