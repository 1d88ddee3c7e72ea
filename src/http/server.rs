//! Router construction.
//!
//! # Responsibilities
//! - Create the axum Router shared by both listeners
//! - Mount the API routes and the static web app
//! - Wire up middleware (tracing, request ID)
//!
//! Transport concerns (timeouts, TLS, draining) belong to the listener units
//! in `net::listener`, not to the router.

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::token::{TokenIssuer, UnconfiguredIssuer};
use crate::version::Version;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub version: Option<Arc<Version>>,
    pub issuer: Arc<dyn TokenIssuer>,
}

impl AppState {
    pub fn new(version: Option<Version>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            version: version.map(Arc::new),
            issuer,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None, Arc::new(UnconfiguredIssuer))
    }
}

/// Build the router served by every listener.
pub fn build_router(state: AppState, content_dir: &Path) -> Router {
    Router::new()
        .route("/v1/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/v1/bearer-token", post(handlers::bearer_token))
        .nest_service("/app", ServeDir::new(content_dir))
        .nest_service("/styles", ServeDir::new(content_dir.join("styles")))
        .nest_service("/images", ServeDir::new(content_dir.join("images")))
        .nest_service("/scripts", ServeDir::new(content_dir.join("scripts")))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
}
