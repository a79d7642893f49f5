//! Typed shapes for intercepted network payloads and DOM-observed messages.
//!
//! Raw intercepted JSON is validated into these structures once at the
//! session boundary; malformed payloads are rejected there instead of being
//! probed field-by-field downstream.

use serde::Deserialize;

/// Synthetic root of a conversation snapshot's node mapping. Never a message.
pub const SNAPSHOT_ROOT_NODE_ID: &str = "client-created-root";

/// One intercepted network payload, tagged by `type`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum InterceptEvent {
    /// A chat completion exchange: the request body carries the outgoing user
    /// turn, the response body (non-streaming only) the assistant reply.
    #[serde(rename = "chatCompletion", rename_all = "camelCase")]
    ChatCompletion {
        #[serde(default)]
        request_body: Option<ChatCompletionRequest>,
        #[serde(default)]
        response_body: Option<ChatCompletionResponse>,
        #[serde(default)]
        is_streaming: bool,
    },
    /// A complete assistant message assembled upstream from a streamed
    /// response.
    #[serde(rename = "assistantResponse", rename_all = "camelCase")]
    AssistantResponse {
        message_id: String,
        content: String,
        #[serde(default)]
        conversation_id: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        create_time: Option<f64>,
        #[serde(default)]
        parent_message_id: Option<String>,
    },
    /// A full conversation-tree snapshot.
    #[serde(rename = "specificConversation", rename_all = "camelCase")]
    SpecificConversation { response_body: ConversationSnapshot },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub messages: Vec<RequestMessage>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<MessageAuthor>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub create_time: Option<f64>,
}

impl RequestMessage {
    /// System and tool entries are interleaved in request message lists; the
    /// author role can live on either the nested author object or the entry
    /// itself.
    pub fn is_user_authored(&self) -> bool {
        self.author.as_ref().and_then(|a| a.role.as_deref()) == Some("user")
            || self.role.as_deref() == Some("user")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageAuthor {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Message content is either a `parts` list or a bare string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Parts {
        #[serde(default)]
        parts: Vec<serde_json::Value>,
    },
    Text(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub create_time: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageMetadata {
    #[serde(default)]
    pub model_slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A full conversation tree keyed by node id. The mapping preserves payload
/// order; individual nodes are validated during extraction so one malformed
/// node never discards the snapshot.
#[derive(Clone, Debug, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mapping: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotNode {
    #[serde(default)]
    pub message: Option<NodeMessage>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeMessage {
    #[serde(default)]
    pub author: Option<MessageAuthor>,
    #[serde(default)]
    pub content: Option<NodeContent>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub create_time: Option<f64>,
}

/// Snapshot node content: `parts` can be an array of strings, an array of
/// multimodal part objects, or a bare string.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeContent {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub parts: Option<serde_json::Value>,
}

/// A message observed in the page DOM rather than on the wire.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedMessage {
    pub role: String,
    pub message_id: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub provider_chat_id: Option<String>,
}
