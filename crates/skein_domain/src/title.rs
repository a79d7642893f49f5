use crate::CONVERSATION_TITLE_MAX_CHARS;

const FALLBACK_CONVERSATION_TITLE: &str = "New conversation";

/// Derives a conversation title from message content: first line, trimmed,
/// truncated to [`CONVERSATION_TITLE_MAX_CHARS`] characters.
pub fn derive_conversation_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    let title: String = first_line.chars().take(CONVERSATION_TITLE_MAX_CHARS).collect();
    if title.is_empty() { FALLBACK_CONVERSATION_TITLE.to_owned() } else { title }
}
