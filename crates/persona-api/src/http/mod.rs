//! HTTP/REST API layer for Persona.
//!
//! Axum-based REST API at `/api/v1/` with envelope responses, CORS, and
//! per-route request metrics.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
