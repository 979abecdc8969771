//! Infrastructure layer for the persona service.
//!
//! Contains implementations of the ports defined in `persona-core`: SQLite
//! repositories, the OpenAI-compatible model client, the simulated trainer,
//! the Prometheus-backed metrics sink, and the configuration loader.

pub mod config;
pub mod llm;
pub mod metrics;
pub mod sqlite;
pub mod training;
