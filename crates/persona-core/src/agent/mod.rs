//! Agent persona handling.
//!
//! - `PromptCompiler`: deterministic `AgentConfig -> system prompt`
//! - `PromptCache`: TTL/capacity-bounded cache of compiled agents

pub mod cache;
pub mod prompt;
