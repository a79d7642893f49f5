use serde::{Deserialize, Serialize};

/// Model attribution used when no source field resolves one; user messages
/// tagged with it may be backfilled from their assistant reply later.
pub const UNKNOWN_MODEL: &str = "unknown";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A canonical message reconstructed from intercepted traffic.
///
/// `conversation_id` stays empty while the owning conversation is unresolved;
/// such messages live in the pending buffer, never in the store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    #[serde(default)]
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub model: String,
    pub timestamp_unix_ms: u64,
    /// Set only for assistant messages; a user message never carries a parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    /// Distinct tool names invoked in producing an assistant message,
    /// insertion order preserved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub last_message_time_unix_ms: u64,
}
