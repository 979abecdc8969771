//! Axum router configuration with middleware.
//!
//! Engine routes live under `/api/v1/`; `/health` and `/metrics` sit at the
//! root. Middleware: CORS, tracing, request metrics.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::middleware::track_requests;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/agents", post(handlers::agent::create_agent))
        .route("/agents/{id}", get(handlers::agent::get_agent))
        .route("/agents/{id}/analytics", get(handlers::agent::get_analytics))
        .route("/agents/{id}/train", post(handlers::training::start_training))
        .route("/training-jobs/{id}", get(handlers::training::get_job))
        .route("/chat", post(handlers::chat::chat))
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .layer(from_fn_with_state(state.clone(), track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
