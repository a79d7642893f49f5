use serde::{Deserialize, Serialize};

/// Provider tag sent with every conversation save.
pub const PROVIDER_NAME: &str = "ChatGPT";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SaveMessageRequest {
    pub message_id: String,
    pub provider_chat_id: String,
    pub content: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    pub model: String,
    pub created_at: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SaveChatRequest {
    pub provider_chat_id: String,
    pub title: String,
    pub provider_name: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SaveBatchRequest {
    pub chats: Vec<SaveChatRequest>,
    pub messages: Vec<SaveMessageRequest>,
}
