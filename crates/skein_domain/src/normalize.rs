//! Turns raw request/response fragments into canonical messages.

use crate::intercept::{ChatCompletionRequest, ChatCompletionResponse, MessageContent};
use crate::time::unix_ms_from_create_time;
use crate::{Message, Role, UNKNOWN_MODEL};

fn content_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Parts { parts } => parts
            .iter()
            .filter_map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        MessageContent::Text(text) => text.clone(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Extracts the user turn that triggered a chat completion request: the last
/// user-authored entry in the request's message list. Returns `None` when no
/// user entry exists or its content trims to empty.
pub fn user_message_from_request(
    request: &ChatCompletionRequest,
    now_unix_ms: u64,
) -> Option<Message> {
    let raw = request.messages.iter().rev().find(|m| m.is_user_authored())?;
    let content = raw.content.as_ref().map(content_text).unwrap_or_default();
    if content.trim().is_empty() {
        return None;
    }
    Some(Message {
        message_id: non_empty(raw.id.clone()).unwrap_or_else(|| format!("user-{now_unix_ms}")),
        conversation_id: request.conversation_id.clone().unwrap_or_default(),
        role: Role::User,
        content,
        model: non_empty(request.model.clone()).unwrap_or_else(|| UNKNOWN_MODEL.to_owned()),
        timestamp_unix_ms: unix_ms_from_create_time(raw.create_time, now_unix_ms),
        parent_message_id: None,
        tools: Vec::new(),
    })
}

/// Extracts the assistant message from a non-streaming chat completion
/// response. Returns `None` when the response carries no message or its
/// content trims to empty.
pub fn assistant_message_from_response(
    response: &ChatCompletionResponse,
    now_unix_ms: u64,
) -> Option<Message> {
    let raw = response.message.as_ref()?;
    let content = raw.content.as_ref().map(content_text).unwrap_or_default();
    if content.trim().is_empty() {
        return None;
    }
    Some(Message {
        message_id: non_empty(raw.id.clone())
            .unwrap_or_else(|| format!("assistant-{now_unix_ms}")),
        conversation_id: response.conversation_id.clone().unwrap_or_default(),
        role: Role::Assistant,
        content,
        model: non_empty(raw.metadata.as_ref().and_then(|m| m.model_slug.clone()))
            .unwrap_or_else(|| UNKNOWN_MODEL.to_owned()),
        timestamp_unix_ms: unix_ms_from_create_time(raw.create_time, now_unix_ms),
        parent_message_id: None,
        tools: Vec::new(),
    })
}
