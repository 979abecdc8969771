//! Shared domain types for Persona.
//!
//! Agents, conversations, training jobs, language-model messages, service
//! configuration, and the error enums shared by every other crate.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror
//! (plus secrecy for the API key).

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod training;
