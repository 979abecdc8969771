//! Trainer implementations.

pub mod simulated;
