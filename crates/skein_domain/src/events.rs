use crate::{Message, Role};
use serde::Serialize;

/// Notifications emitted to session subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ConversationChanged {
        conversation_id: String,
    },
    MessageSent {
        message_id: String,
        content: String,
        conversation_id: String,
    },
    MessageReceived {
        message_id: String,
        content: String,
        role: Role,
        conversation_id: String,
    },
    ConversationLoaded {
        conversation_id: String,
        title: String,
        messages: Vec<Message>,
    },
}
