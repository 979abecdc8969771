//! Conversation log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::agent::AgentId;
use crate::llm::{Message, MessageRole};

/// Identifier of an append-only conversation log.
///
/// Callers may supply their own; otherwise one is minted from the user id,
/// agent id and creation time plus a random suffix so that two conversations
/// started in the same millisecond never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn mint(user_id: &str, agent_id: &AgentId, now: DateTime<Utc>) -> Self {
        Self(format!(
            "conv_{user_id}_{agent_id}_{}_{}",
            now.timestamp_millis(),
            random_suffix()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Twelve hex characters from the random tail of a v7 UUID.
pub(crate) fn random_suffix() -> String {
    let simple = Uuid::now_v7().simple().to_string();
    simple[simple.len() - 12..].to_string()
}

/// One message in a conversation. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ConversationTurn {
    pub fn new(role: MessageRole, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// The model-facing view of this turn.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A group of turns appended to one conversation in a single atomic write.
#[derive(Debug, Clone)]
pub struct TurnBatch {
    pub conversation_id: ConversationId,
    pub agent_id: AgentId,
    pub user_id: String,
    pub turns: Vec<ConversationTurn>,
}

/// Full conversation as returned by `GET /conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    pub conversation_id: ConversationId,
    pub messages: Vec<ConversationTurn>,
}

/// One chat call: a user message addressed to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub agent_id: AgentId,
    pub user_id: String,
    pub message: String,
    /// Continue this conversation; a new id is minted when absent.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    /// Caller-supplied context, stored on the user turn.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// Reply to a chat call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub conversation_id: ConversationId,
    pub tokens_used: Option<u32>,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mint_embeds_parts() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let id = ConversationId::mint("u42", &AgentId::new("luna"), now);
        let s = id.as_str();
        assert!(s.starts_with(&format!("conv_u42_luna_{}_", now.timestamp_millis())));
        let suffix = s.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_mint_same_tick_differs() {
        let now = Utc::now();
        let agent = AgentId::new("a");
        let a = ConversationId::mint("u", &agent, now);
        let b = ConversationId::mint("u", &agent, now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_turn_metadata_and_message() {
        let turn = ConversationTurn::new(MessageRole::User, "hello", Utc::now())
            .with_metadata("user_id", "u1");
        assert_eq!(turn.metadata["user_id"], "u1");
        let msg = turn.to_message();
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_chat_request_optional_fields() {
        let json = r#"{"agent_id":"luna","user_id":"u1","message":"hi"}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert!(req.conversation_id.is_none());
        assert!(req.context.is_empty());
    }

    #[test]
    fn test_turn_deserialize_without_metadata() {
        let json = r#"{"role":"assistant","content":"hi","timestamp":"2025-01-01T00:00:00Z"}"#;
        let turn: ConversationTurn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.role, MessageRole::Assistant);
        assert!(turn.metadata.is_empty());
    }
}
