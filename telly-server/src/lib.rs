//! HTTP surface for the telly catalog.
//!
//! Read routes are served from the local catalog through a read-through
//! response cache; shows and seasons missing locally are fetched from the
//! origin API. Search and any other `/tv/*` path are forwarded to the origin.

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use infra::app_state::AppState;

use handlers::health::{health_handler, ping_handler};

/// The complete application router, ready to serve.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = infra::startup::cors_layer(state.config());

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .merge(routes::create_router(state.clone()))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
