use crate::{Conversation, ConversationStore, Message, PendingBuffer};

/// Full session state: the conversation the page is looking at, the message
/// store, and the buffer of messages whose conversation is still unknown.
///
/// Mutation happens exclusively through [`SessionState::apply`] in the
/// reducer module; everything here is read access.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub(crate) current_conversation_id: Option<String>,
    pub(crate) store: ConversationStore,
    pub(crate) pending: PendingBuffer,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.current_conversation_id.as_deref()
    }

    pub fn conversation_messages(&self, conversation_id: &str) -> &[Message] {
        self.store.messages(conversation_id)
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<&Conversation> {
        self.store.conversation(conversation_id)
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.store.conversations()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
