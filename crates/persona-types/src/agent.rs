//! Agent persona configuration and the stored agent record.
//!
//! An [`AgentConfig`] is what a creator submits. It is immutable once
//! persisted; the repository wraps it in an [`AgentRecord`] together with the
//! computed system prompt and lifecycle timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::training::JobStatus;

/// Upper bound (inclusive) for the sampling temperature.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Opaque, creator-assigned agent identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How the agent sounds and what it knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub tone: String,
    /// Areas of expertise, rendered in the given order.
    pub expertise: Vec<String>,
    pub response_style: String,
    pub language_style: String,
    /// Marketplace template this personality was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// A named capability flag with a fixed prompt directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Conversation,
    ContentCreation,
    Recommendations,
    CustomerService,
    DataAnalysis,
}

impl Capability {
    /// All flags in prompt order.
    pub const ALL: [Capability; 5] = [
        Capability::Conversation,
        Capability::ContentCreation,
        Capability::Recommendations,
        Capability::CustomerService,
        Capability::DataAnalysis,
    ];

    /// The one directive sentence this capability contributes to a prompt.
    pub fn directive(self) -> &'static str {
        match self {
            Capability::Conversation => "Engage in natural conversations",
            Capability::ContentCreation => "Create engaging content",
            Capability::Recommendations => "Provide personalized recommendations",
            Capability::CustomerService => "Assist with customer service inquiries",
            Capability::DataAnalysis => "Analyze and interpret data",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Conversation => write!(f, "conversation"),
            Capability::ContentCreation => write!(f, "content_creation"),
            Capability::Recommendations => write!(f, "recommendations"),
            Capability::CustomerService => write!(f, "customer_service"),
            Capability::DataAnalysis => write!(f, "data_analysis"),
        }
    }
}

/// Capability flags plus free-form custom capability names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "default_true")]
    pub conversation: bool,
    #[serde(default)]
    pub content_creation: bool,
    #[serde(default)]
    pub recommendations: bool,
    #[serde(default)]
    pub customer_service: bool,
    #[serde(default)]
    pub data_analysis: bool,
    #[serde(default)]
    pub custom_capabilities: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            conversation: true,
            content_creation: false,
            recommendations: false,
            customer_service: false,
            data_analysis: false,
            custom_capabilities: Vec::new(),
        }
    }
}

impl Capabilities {
    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Conversation => self.conversation,
            Capability::ContentCreation => self.content_creation,
            Capability::Recommendations => self.recommendations,
            Capability::CustomerService => self.customer_service,
            Capability::DataAnalysis => self.data_analysis,
        }
    }

    /// Enabled flags, in [`Capability::ALL`] order.
    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
    }
}

/// Configuration submitted when creating an agent.
///
/// Generation parameters default to the values the service has always used
/// (temperature 0.7, 1000 output tokens, 10 turns of context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_id: AgentId,
    pub name: String,
    pub creator_id: String,
    pub personality: Personality,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Number of most recent turns loaded as context for each chat call.
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: u32,
    /// Edits produce a new version; the first version is 1.
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

pub fn default_max_context_turns() -> u32 {
    10
}

fn default_version() -> u32 {
    1
}

impl AgentConfig {
    /// Check the invariants that must hold before the config is persisted.
    pub fn validate(&self) -> Result<(), String> {
        if self.agent_id.as_str().trim().is_empty() {
            return Err("agent_id cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.creator_id.trim().is_empty() {
            return Err("creator_id cannot be empty".to_string());
        }
        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0 and {MAX_TEMPERATURE}, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.max_context_turns == 0 {
            return Err("max_context_turns must be greater than 0".to_string());
        }
        if self.version == 0 {
            return Err("version must start at 1".to_string());
        }
        Ok(())
    }
}

/// Lifecycle state of an agent record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
        }
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AgentStatus::Active),
            other => Err(format!("invalid agent status: '{other}'")),
        }
    }
}

/// A persisted agent: the submitted config plus computed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    #[serde(flatten)]
    pub config: AgentConfig,
    pub system_prompt: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when a training job for this agent completes.
    pub last_trained_at: Option<DateTime<Utc>>,
    pub training_status: Option<JobStatus>,
}

impl AgentRecord {
    pub fn id(&self) -> &AgentId {
        &self.config.agent_id
    }
}

/// Conversation counts for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAnalytics {
    pub agent_id: AgentId,
    /// Stored exchanges, one per chat call.
    pub total_conversations: u64,
    /// The most recent exchanges, capped at ten.
    pub recent_conversations: u64,
    pub status: String,
}
