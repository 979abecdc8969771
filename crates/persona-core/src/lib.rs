//! Business logic and repository trait definitions for the persona service.
//!
//! This crate defines the "ports" (repository, model client, trainer and
//! metrics traits) that the infrastructure layer implements. It depends only
//! on `persona-types` -- never on `persona-infra` or any database/IO crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod metrics;
pub mod repository;
pub mod service;
pub mod training;

#[cfg(test)]
mod test_support;
