//! Metrics backends.

pub mod prometheus;
