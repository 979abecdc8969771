//! Logging and trace export setup for the persona service.

pub mod tracing_setup;
