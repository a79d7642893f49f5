use crate::{Conversation, Message, SessionEvent};

/// Side effects requested by the reducer. The caller decides how to run
/// them; the reducer itself never touches the network.
#[derive(Clone, Debug)]
pub enum Effect {
    SaveMessage { message: Message },
    SaveConversation { conversation: Conversation },
    /// A conversation and its full message list, persisted in one request.
    SaveConversationBatch { conversation: Conversation, messages: Vec<Message> },
    Notify { event: SessionEvent },
}
