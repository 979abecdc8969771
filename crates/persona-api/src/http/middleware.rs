//! Request metrics middleware.
//!
//! Labels use the matched route template (`/api/v1/agents/{id}`) rather than
//! the raw path, so ids never become label values.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use persona_core::metrics::{REQUEST_DURATION_SECONDS, REQUESTS_TOTAL};

use crate::state::AppState;

/// Route label for requests that matched no route.
const UNMATCHED: &str = "unmatched";

pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED.to_string());

    let response = next.run(request).await;

    state.metrics.increment_counter(
        REQUESTS_TOTAL,
        &[("method", method), ("endpoint", endpoint)],
    );
    state
        .metrics
        .observe_duration(REQUEST_DURATION_SECONDS, started.elapsed().as_secs_f64());
    response
}
