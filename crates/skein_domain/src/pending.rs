//! Buffer for messages that arrive before their conversation id is known.

use crate::Message;

/// Entries older than this are silently dropped; a conversation id that
/// never materializes means the turn was abandoned.
pub const PENDING_RETENTION_MS: u64 = 5 * 60 * 1000;

#[derive(Clone, Debug)]
pub struct PendingEntry {
    pub message: Message,
    pub enqueued_at_unix_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct PendingBuffer {
    entries: Vec<PendingEntry>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: Message, now_unix_ms: u64) {
        self.sweep_expired(now_unix_ms);
        self.entries.push(PendingEntry { message, enqueued_at_unix_ms: now_unix_ms });
    }

    /// Assigns `conversation_id` to every buffered message, empties the
    /// buffer, and returns the messages in enqueue order.
    pub fn flush(&mut self, conversation_id: &str) -> Vec<Message> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| {
                let mut message = entry.message;
                message.conversation_id = conversation_id.to_owned();
                message
            })
            .collect()
    }

    pub fn sweep_expired(&mut self, now_unix_ms: u64) {
        self.entries
            .retain(|entry| now_unix_ms.saturating_sub(entry.enqueued_at_unix_ms) < PENDING_RETENTION_MS);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
