//! Chat orchestration for persona agents.
//!
//! `ChatOrchestrator` drives a single exchange: prompt + windowed history +
//! new message -> language model -> atomic persistence of the pair.

pub mod orchestrator;
