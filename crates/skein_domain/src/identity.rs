//! Conversation identity resolution from navigation URLs and raw payloads.

use serde_json::Value;

/// Path prefix that precedes a conversation id in the chat app's URLs.
const CONVERSATION_PATH_PREFIX: &str = "/c/";

fn is_conversation_id_char(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f' | '-')
}

/// Extracts a conversation id (a UUID-like lowercase hex segment) from a
/// navigation URL. Returns `None` when the URL does not address a
/// conversation.
pub fn conversation_id_from_url(url: &str) -> Option<String> {
    let start = url.find(CONVERSATION_PATH_PREFIX)? + CONVERSATION_PATH_PREFIX.len();
    let id: String = url[start..].chars().take_while(|c| is_conversation_id_char(*c)).collect();
    if id.is_empty() { None } else { Some(id) }
}

fn explicit_conversation_id(value: &Value) -> Option<String> {
    let id = value.get("conversation_id")?.as_str()?.trim();
    if id.is_empty() { None } else { Some(id.to_owned()) }
}

/// Extracts an explicit `conversation_id` field from a raw intercepted
/// payload envelope, checking the envelope itself, then the request body,
/// then the response body.
pub fn conversation_id_from_payload(payload: &Value) -> Option<String> {
    explicit_conversation_id(payload)
        .or_else(|| payload.get("requestBody").and_then(explicit_conversation_id))
        .or_else(|| payload.get("responseBody").and_then(explicit_conversation_id))
}
