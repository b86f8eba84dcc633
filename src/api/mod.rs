//! HTTP API
//!
//! An axum router over [`ClinicServices`]. Handlers live in [`routes`], one
//! module per resource; every response uses the envelopes in [`response`].
//!
//! # Example
//!
//! ```rust,no_run
//! use clinic::adapters::database::create_stores;
//! use clinic::api::{router, AppState};
//! use clinic::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clinic.toml")?;
//! let (store, notes) = create_stores(&config).await?;
//! let app = router(AppState::new(&config, store, notes), &config.server);
//!
//! let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod response;
pub mod routes;

use crate::adapters::database::{ClinicStore, NoteStore};
use crate::config::schema::{ClinicConfig, ServerConfig};
use crate::core::services::ClinicServices;
use crate::domain::ClinicError;
use axum::http::{HeaderValue, Method, Uri};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ClinicServices>,
    pub backend: &'static str,
}

impl AppState {
    pub fn new(
        config: &ClinicConfig,
        store: Arc<dyn ClinicStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        let backend = store.backend_name();
        Self {
            services: Arc::new(ClinicServices::new(config, store, notes)),
            backend,
        }
    }
}

/// Builds the full application router
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/auth", routes::auth::router())
        .nest("/api/users", routes::users::router())
        .nest("/api/doctors", routes::doctors::router())
        .nest("/api/patients", routes::patients::router())
        .nest("/api/appointments", routes::appointments::router())
        .nest("/api/prescriptions", routes::prescriptions::router())
        .nest("/api/medical-records", routes::records::router())
        .fallback(unknown_route)
        .layer(axum::middleware::from_fn(response::attach_error_path))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(cors_layer(&server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn unknown_route(uri: Uri) -> ClinicError {
    ClinicError::not_found("Route", uri.path())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
