mod message;
pub use message::{Conversation, Message, Role, UNKNOWN_MODEL};

mod identity;
pub use identity::{conversation_id_from_payload, conversation_id_from_url};

mod intercept;
pub use intercept::{
    ChatCompletionRequest, ChatCompletionResponse, ConversationSnapshot, InterceptEvent,
    MessageAuthor, MessageContent, MessageMetadata, NodeContent, NodeMessage, ObservedMessage,
    RequestMessage, ResponseMessage, SNAPSHOT_ROOT_NODE_ID, SnapshotNode,
};

mod normalize;
pub use normalize::{assistant_message_from_response, user_message_from_request};

mod tree;
pub use tree::{ExtractedConversation, extract_conversation};

mod pending;
pub use pending::{PENDING_RETENTION_MS, PendingBuffer, PendingEntry};

mod store;
pub use store::ConversationStore;

mod title;
pub use title::derive_conversation_title;

mod actions;
pub use actions::Action;
mod effects;
pub use effects::Effect;
mod events;
pub use events::SessionEvent;

mod reducer;
mod state;
pub use state::SessionState;

mod time;

pub const CONVERSATION_TITLE_MAX_CHARS: usize = 50;
