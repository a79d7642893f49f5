//! In-memory index of conversations and their message lists.
//!
//! The store owns the canonical map from conversation id to conversation and
//! messages; every mutation goes through its methods so a later event never
//! observes a partially-updated state.

use crate::{Conversation, Message, derive_conversation_title};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<String, Conversation>,
    messages: HashMap<String, Vec<Message>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent per message id: an existing entry is replaced in place,
    /// otherwise the message is appended; the list stays sorted by timestamp.
    ///
    /// The first message for an unknown conversation id auto-creates the
    /// conversation with a title derived from that message's content.
    /// Returns `false` (and stores nothing) when the conversation id is
    /// empty; such messages belong in the pending buffer.
    pub fn upsert_message(&mut self, message: Message) -> bool {
        if message.conversation_id.is_empty() {
            return false;
        }
        let conversation_id = message.conversation_id.clone();
        self.conversations
            .entry(conversation_id.clone())
            .and_modify(|conversation| {
                conversation.last_message_time_unix_ms =
                    conversation.last_message_time_unix_ms.max(message.timestamp_unix_ms);
            })
            .or_insert_with(|| Conversation {
                id: conversation_id.clone(),
                title: derive_conversation_title(&message.content),
                last_message_time_unix_ms: message.timestamp_unix_ms,
            });

        let list = self.messages.entry(conversation_id).or_default();
        if let Some(existing) = list.iter_mut().find(|m| m.message_id == message.message_id) {
            *existing = message;
        } else {
            list.push(message);
        }
        list.sort_by_key(|m| m.timestamp_unix_ms);
        true
    }

    /// Explicit conversations (snapshot or list events) overwrite derived
    /// ones, title included.
    pub fn upsert_conversation(&mut self, conversation: Conversation) {
        self.conversations.insert(conversation.id.clone(), conversation);
    }

    pub fn contains_conversation(&self, conversation_id: &str) -> bool {
        self.conversations.contains_key(conversation_id)
    }

    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages.get(conversation_id).map_or(&[], Vec::as_slice)
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.get(conversation_id)
    }

    /// All conversations, most recently active first.
    pub fn conversations(&self) -> Vec<Conversation> {
        let mut all: Vec<Conversation> = self.conversations.values().cloned().collect();
        all.sort_by(|a, b| b.last_message_time_unix_ms.cmp(&a.last_message_time_unix_ms));
        all
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.messages.clear();
    }
}
