//! Persistence boundary: converts domain records to wire requests and ships
//! them to the capture backend.

use anyhow::Context as _;
use skein_api::{PROVIDER_NAME, SaveBatchRequest, SaveChatRequest, SaveMessageRequest};
use skein_domain::{Conversation, Message};
use std::time::Duration;

/// Blocking persistence calls, invoked off the engine loop via
/// `spawn_blocking`. Implementations must tolerate being called for the same
/// record more than once.
pub trait PersistenceGateway: Send + Sync {
    fn save_message(&self, request: &SaveMessageRequest) -> anyhow::Result<()>;
    fn save_chat(&self, request: &SaveChatRequest) -> anyhow::Result<()>;
    fn save_batch(&self, request: &SaveBatchRequest) -> anyhow::Result<()>;
}

pub fn message_save_request(message: &Message) -> SaveMessageRequest {
    SaveMessageRequest {
        message_id: message.message_id.clone(),
        provider_chat_id: message.conversation_id.clone(),
        content: message.content.clone(),
        role: message.role.as_str().to_owned(),
        parent_message_id: message.parent_message_id.clone(),
        model: message.model.clone(),
        created_at: message.timestamp_unix_ms,
    }
}

pub fn chat_save_request(conversation: &Conversation) -> SaveChatRequest {
    SaveChatRequest {
        provider_chat_id: conversation.id.clone(),
        title: conversation.title.clone(),
        provider_name: PROVIDER_NAME.to_owned(),
    }
}

pub fn batch_save_request(conversation: &Conversation, messages: &[Message]) -> SaveBatchRequest {
    SaveBatchRequest {
        chats: vec![chat_save_request(conversation)],
        messages: messages.iter().map(message_save_request).collect(),
    }
}

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway that POSTs JSON to the capture backend's save endpoints.
pub struct HttpPersistenceGateway {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpPersistenceGateway {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> anyhow::Result<()> {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .with_context(|| format!("POST {path} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {path} rejected"))?;
        Ok(())
    }
}

impl PersistenceGateway for HttpPersistenceGateway {
    fn save_message(&self, request: &SaveMessageRequest) -> anyhow::Result<()> {
        self.post("/save/message", request)
    }

    fn save_chat(&self, request: &SaveChatRequest) -> anyhow::Result<()> {
        self.post("/save/chat", request)
    }

    fn save_batch(&self, request: &SaveBatchRequest) -> anyhow::Result<()> {
        self.post("/save/batch", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_domain::Role;

    #[test]
    fn message_request_carries_every_field() {
        let message = Message {
            message_id: "m1".to_owned(),
            conversation_id: "abc".to_owned(),
            role: Role::Assistant,
            content: "Hi there".to_owned(),
            model: "gpt-x".to_owned(),
            timestamp_unix_ms: 1000,
            parent_message_id: Some("u1".to_owned()),
            tools: vec!["browser".to_owned()],
        };
        let request = message_save_request(&message);
        assert_eq!(request.provider_chat_id, "abc");
        assert_eq!(request.role, "assistant");
        assert_eq!(request.parent_message_id.as_deref(), Some("u1"));
        assert_eq!(request.created_at, 1000);
    }

    #[test]
    fn chat_request_tags_the_provider() {
        let conversation = Conversation {
            id: "abc".to_owned(),
            title: "Tides".to_owned(),
            last_message_time_unix_ms: 1000,
        };
        let request = chat_save_request(&conversation);
        assert_eq!(request.provider_name, PROVIDER_NAME);
        assert_eq!(request.provider_chat_id, "abc");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let gateway = HttpPersistenceGateway::new("http://localhost:3000/").unwrap();
        assert_eq!(gateway.base_url, "http://localhost:3000");
    }
}
