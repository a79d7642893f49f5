use crate::intercept::{ChatCompletionRequest, ChatCompletionResponse, ConversationSnapshot, ObservedMessage};

/// Everything the outside world can tell a session. Actions are applied by
/// [`crate::SessionState::apply`], which returns the effects to run.
#[derive(Clone, Debug)]
pub enum Action {
    /// The page navigated; the conversation id is resolved from the path.
    UrlChanged { url: String },
    /// The embedder selected a conversation directly, without navigation.
    ConversationSelected { conversation_id: String },
    /// An intercepted chat completion exchange. The response is only
    /// consulted when `is_streaming` is false; streamed replies arrive later
    /// as [`Action::AssistantResponseAssembled`].
    ChatCompletionIntercepted {
        request: Option<ChatCompletionRequest>,
        response: Option<ChatCompletionResponse>,
        is_streaming: bool,
    },
    /// A streamed assistant reply, assembled from its chunks by the
    /// interceptor.
    AssistantResponseAssembled {
        message_id: String,
        content: String,
        conversation_id: Option<String>,
        model: Option<String>,
        create_time: Option<f64>,
        parent_message_id: Option<String>,
    },
    /// A full conversation snapshot fetched when the page opened an existing
    /// conversation.
    ConversationSnapshotReceived { snapshot: ConversationSnapshot },
    /// A message scraped from the page itself rather than the network layer.
    MessageObserved { observed: ObservedMessage },
    /// Drops all session state, store and pending buffer included.
    Reset,
}
