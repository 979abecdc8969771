//! Language-model client abstractions.
//!
//! - `LanguageModelClient`: RPITIT trait for concrete backends
//! - `BoxModelClient`: object-safe wrapper for dynamic dispatch

pub mod box_client;
pub mod client;
