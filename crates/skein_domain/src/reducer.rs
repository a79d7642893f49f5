//! The session reducer: applies an [`Action`] to [`SessionState`] and
//! returns the [`Effect`]s the caller must run.

use crate::intercept::ObservedMessage;
use crate::time::{now_unix_ms, unix_ms_from_create_time};
use crate::{
    Action, Effect, Message, Role, SessionEvent, SessionState, UNKNOWN_MODEL,
    assistant_message_from_response, conversation_id_from_url, extract_conversation,
    user_message_from_request,
};

impl SessionState {
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        let now = now_unix_ms();
        match action {
            Action::UrlChanged { url } => match conversation_id_from_url(&url) {
                Some(conversation_id) => {
                    if self.current_conversation_id.as_deref() == Some(conversation_id.as_str()) {
                        return Vec::new();
                    }
                    self.current_conversation_id = Some(conversation_id.clone());
                    let mut effects = self.flush_pending(&conversation_id);
                    effects.push(Effect::Notify {
                        event: SessionEvent::ConversationChanged { conversation_id },
                    });
                    effects
                }
                // Any other path means a fresh chat page with no
                // conversation yet.
                None => {
                    self.current_conversation_id = None;
                    Vec::new()
                }
            },
            Action::ConversationSelected { conversation_id } => {
                if conversation_id.is_empty() {
                    return Vec::new();
                }
                self.current_conversation_id = Some(conversation_id.clone());
                self.flush_pending(&conversation_id)
            }
            Action::ChatCompletionIntercepted { request, response, is_streaming } => {
                let mut effects = Vec::new();
                if let Some(request) = request
                    && let Some(message) = user_message_from_request(&request, now)
                {
                    effects.extend(self.accept_user_message(message, now));
                }
                if !is_streaming
                    && let Some(response) = response
                    && let Some(message) = assistant_message_from_response(&response, now)
                {
                    effects.extend(self.accept_assistant_message(message, now));
                }
                effects
            }
            Action::AssistantResponseAssembled {
                message_id,
                content,
                conversation_id,
                model,
                create_time,
                parent_message_id,
            } => {
                if message_id.trim().is_empty() || content.trim().is_empty() {
                    return Vec::new();
                }
                let message = Message {
                    message_id,
                    conversation_id: conversation_id.unwrap_or_default(),
                    role: Role::Assistant,
                    content,
                    model: model
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| UNKNOWN_MODEL.to_owned()),
                    timestamp_unix_ms: unix_ms_from_create_time(create_time, now),
                    parent_message_id,
                    tools: Vec::new(),
                };
                self.accept_assistant_message(message, now)
            }
            Action::ConversationSnapshotReceived { snapshot } => {
                let extracted = extract_conversation(&snapshot, now);
                let conversation_id = extracted.conversation.id.clone();
                self.store.upsert_conversation(extracted.conversation.clone());
                for message in &extracted.messages {
                    self.store.upsert_message(message.clone());
                }
                self.current_conversation_id = Some(conversation_id.clone());
                let mut effects = self.flush_pending(&conversation_id);
                let messages = self.store.messages(&conversation_id).to_vec();
                effects.push(Effect::Notify {
                    event: SessionEvent::ConversationLoaded {
                        conversation_id,
                        title: extracted.conversation.title.clone(),
                        messages: messages.clone(),
                    },
                });
                effects.push(Effect::SaveConversationBatch {
                    conversation: extracted.conversation,
                    messages,
                });
                effects
            }
            Action::MessageObserved { observed } => {
                let Some(message) = message_from_observation(observed, now) else {
                    return Vec::new();
                };
                match message.role {
                    Role::User => self.accept_user_message(message, now),
                    Role::Assistant => self.accept_assistant_message(message, now),
                }
            }
            Action::Reset => {
                self.current_conversation_id = None;
                self.store.clear();
                self.pending.clear();
                Vec::new()
            }
        }
    }

    /// A user message without a conversation id is attributed to the
    /// conversation the page is on; only when there is none does it wait in
    /// the pending buffer.
    fn accept_user_message(&mut self, mut message: Message, now: u64) -> Vec<Effect> {
        if message.conversation_id.is_empty()
            && let Some(current) = &self.current_conversation_id
        {
            message.conversation_id = current.clone();
        }
        if message.conversation_id.is_empty() {
            self.pending.enqueue(message, now);
            return Vec::new();
        }
        let conversation_id = message.conversation_id.clone();
        self.current_conversation_id = Some(conversation_id.clone());
        let event = SessionEvent::MessageSent {
            message_id: message.message_id.clone(),
            content: message.content.clone(),
            conversation_id,
        };
        self.store.upsert_message(message.clone());
        vec![Effect::Notify { event }, Effect::SaveMessage { message }]
    }

    /// Assistant messages carry the authoritative conversation id. One that
    /// arrives without it is buffered rather than guessed at, since a reply
    /// for a brand-new conversation names the id before the page does.
    fn accept_assistant_message(&mut self, message: Message, now: u64) -> Vec<Effect> {
        if message.conversation_id.is_empty() {
            self.pending.enqueue(message, now);
            return Vec::new();
        }
        let conversation_id = message.conversation_id.clone();
        let is_new = !self.store.contains_conversation(&conversation_id);
        let event = SessionEvent::MessageReceived {
            message_id: message.message_id.clone(),
            content: message.content.clone(),
            role: message.role,
            conversation_id: conversation_id.clone(),
        };
        self.store.upsert_message(message.clone());
        self.current_conversation_id = Some(conversation_id.clone());

        let mut effects = Vec::new();
        if is_new {
            if let Some(conversation) = self.store.conversation(&conversation_id) {
                effects.push(Effect::SaveConversation { conversation: conversation.clone() });
            }
            effects.extend(self.flush_pending(&conversation_id));
        }
        effects.push(Effect::Notify { event });
        effects.push(Effect::SaveMessage { message });
        effects
    }

    fn flush_pending(&mut self, conversation_id: &str) -> Vec<Effect> {
        self.pending
            .flush(conversation_id)
            .into_iter()
            .filter(|message| self.store.upsert_message(message.clone()))
            .map(|message| Effect::SaveMessage { message })
            .collect()
    }
}

fn message_from_observation(observed: ObservedMessage, now: u64) -> Option<Message> {
    let role = Role::parse(&observed.role)?;
    if observed.message_id.trim().is_empty() || observed.message.trim().is_empty() {
        return None;
    }
    Some(Message {
        message_id: observed.message_id,
        conversation_id: observed.provider_chat_id.unwrap_or_default(),
        role,
        content: observed.message,
        model: UNKNOWN_MODEL.to_owned(),
        timestamp_unix_ms: observed.timestamp.unwrap_or(now),
        parent_message_id: None,
        tools: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completion(request: serde_json::Value, streaming: bool) -> Action {
        Action::ChatCompletionIntercepted {
            request: Some(serde_json::from_value(request).unwrap()),
            response: None,
            is_streaming: streaming,
        }
    }

    fn user_request(id: Option<&str>, conversation_id: Option<&str>, text: &str) -> Action {
        let mut entry = json!({
            "author": { "role": "user" },
            "content": { "parts": [text] }
        });
        if let Some(id) = id {
            entry["id"] = json!(id);
        }
        let mut body = json!({ "messages": [entry] });
        if let Some(conversation_id) = conversation_id {
            body["conversation_id"] = json!(conversation_id);
        }
        completion(body, true)
    }

    fn notify_events(effects: &[Effect]) -> Vec<&SessionEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify { event } => Some(event),
                _ => None,
            })
            .collect()
    }

    fn saved_message_ids(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::SaveMessage { message } => Some(message.message_id.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn navigation_sets_the_current_conversation_and_notifies() {
        let mut state = SessionState::new();
        let effects = state.apply(Action::UrlChanged {
            url: "https://chat.example.com/c/abc-123".to_owned(),
        });

        assert_eq!(state.current_conversation_id(), Some("abc-123"));
        assert_eq!(
            notify_events(&effects),
            [&SessionEvent::ConversationChanged { conversation_id: "abc-123".to_owned() }]
        );

        // Re-navigating to the same conversation is a no-op.
        let effects = state.apply(Action::UrlChanged {
            url: "https://chat.example.com/c/abc-123".to_owned(),
        });
        assert!(effects.is_empty());

        // Leaving for a non-conversation page clears the current id.
        let effects = state.apply(Action::UrlChanged {
            url: "https://chat.example.com/settings".to_owned(),
        });
        assert!(effects.is_empty());
        assert_eq!(state.current_conversation_id(), None);
    }

    #[test]
    fn user_message_with_a_conversation_id_is_stored_and_persisted() {
        let mut state = SessionState::new();
        let effects = state.apply(user_request(Some("u1"), Some("abc"), "Hello"));

        assert_eq!(state.conversation_messages("abc").len(), 1);
        assert_eq!(state.current_conversation_id(), Some("abc"));
        assert_eq!(saved_message_ids(&effects), ["u1"]);
        assert_eq!(
            notify_events(&effects),
            [&SessionEvent::MessageSent {
                message_id: "u1".to_owned(),
                content: "Hello".to_owned(),
                conversation_id: "abc".to_owned(),
            }]
        );
    }

    #[test]
    fn user_message_without_an_id_attaches_to_the_current_conversation() {
        let mut state = SessionState::new();
        state.apply(Action::UrlChanged { url: "https://chat.example.com/c/abc123".to_owned() });
        let effects = state.apply(user_request(Some("u1"), None, "Hello"));

        let messages = state.conversation_messages("abc123");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(saved_message_ids(&effects), ["u1"]);
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn user_message_on_a_fresh_chat_waits_in_the_pending_buffer() {
        let mut state = SessionState::new();
        let effects = state.apply(user_request(Some("u1"), None, "Hello"));

        assert!(effects.is_empty());
        assert_eq!(state.pending_len(), 1);
        assert!(state.conversations().is_empty());
    }

    #[test]
    fn assistant_reply_without_an_id_never_guesses_the_conversation() {
        let mut state = SessionState::new();
        state.apply(Action::UrlChanged { url: "https://chat.example.com/c/abc123".to_owned() });
        let effects = state.apply(Action::AssistantResponseAssembled {
            message_id: "a1".to_owned(),
            content: "Hi there".to_owned(),
            conversation_id: None,
            model: None,
            create_time: None,
            parent_message_id: None,
        });

        assert!(effects.is_empty());
        assert_eq!(state.pending_len(), 1);
        assert!(state.conversation_messages("abc123").is_empty());
    }

    #[test]
    fn assistant_reply_creates_the_conversation_and_flushes_pending() {
        let mut state = SessionState::new();
        state.apply(user_request(Some("u1"), None, "Hello"));
        assert_eq!(state.pending_len(), 1);

        let effects = state.apply(Action::AssistantResponseAssembled {
            message_id: "a1".to_owned(),
            content: "Hi there".to_owned(),
            conversation_id: Some("fresh".to_owned()),
            model: Some("gpt-x".to_owned()),
            create_time: None,
            parent_message_id: None,
        });

        assert_eq!(state.pending_len(), 0);
        assert_eq!(state.current_conversation_id(), Some("fresh"));
        let messages = state.conversation_messages("fresh");
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.message_id == "u1"));
        assert!(messages.iter().any(|m| m.message_id == "a1"));

        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SaveConversation { conversation } if conversation.id == "fresh"
        )));
        let saved = saved_message_ids(&effects);
        assert!(saved.contains(&"u1"));
        assert!(saved.contains(&"a1"));
    }

    #[test]
    fn known_conversation_reply_skips_conversation_save() {
        let mut state = SessionState::new();
        state.apply(user_request(Some("u1"), Some("abc"), "Hello"));
        let effects = state.apply(Action::AssistantResponseAssembled {
            message_id: "a1".to_owned(),
            content: "Hi there".to_owned(),
            conversation_id: Some("abc".to_owned()),
            model: None,
            create_time: None,
            parent_message_id: None,
        });

        assert!(!effects.iter().any(|e| matches!(e, Effect::SaveConversation { .. })));
        assert_eq!(saved_message_ids(&effects), ["a1"]);
    }

    #[test]
    fn non_streaming_completion_yields_both_turns() {
        let mut state = SessionState::new();
        let effects = state.apply(Action::ChatCompletionIntercepted {
            request: Some(
                serde_json::from_value(json!({
                    "conversation_id": "abc",
                    "model": "gpt-x",
                    "messages": [
                        { "id": "u1", "author": { "role": "user" }, "content": { "parts": ["Hello"] } }
                    ]
                }))
                .unwrap(),
            ),
            response: Some(
                serde_json::from_value(json!({
                    "conversation_id": "abc",
                    "message": { "id": "a1", "content": { "parts": ["Hi there"] } }
                }))
                .unwrap(),
            ),
            is_streaming: false,
        });

        assert_eq!(state.conversation_messages("abc").len(), 2);
        assert_eq!(saved_message_ids(&effects), ["u1", "a1"]);
    }

    #[test]
    fn streaming_completion_ignores_the_response_body() {
        let mut state = SessionState::new();
        state.apply(Action::ChatCompletionIntercepted {
            request: None,
            response: Some(
                serde_json::from_value(json!({
                    "conversation_id": "abc",
                    "message": { "id": "a1", "content": { "parts": ["partial"] } }
                }))
                .unwrap(),
            ),
            is_streaming: true,
        });
        assert!(state.conversation_messages("abc").is_empty());
    }

    #[test]
    fn snapshot_loads_the_conversation_and_requests_a_batch_save() {
        let mut state = SessionState::new();
        let snapshot = serde_json::from_value(json!({
            "conversation_id": "abc",
            "title": "Tides",
            "mapping": {
                "root": { "id": "root", "children": ["u1"] },
                "u1": {
                    "id": "u1",
                    "children": ["a1"],
                    "message": {
                        "id": "u1",
                        "author": { "role": "user" },
                        "content": { "content_type": "text", "parts": ["How do tides work?"] },
                        "create_time": 1.0
                    }
                },
                "a1": {
                    "id": "a1",
                    "children": [],
                    "message": {
                        "id": "a1",
                        "author": { "role": "assistant" },
                        "content": { "content_type": "text", "parts": ["Gravity."] },
                        "metadata": { "model_slug": "gpt-x" },
                        "create_time": 2.0
                    }
                }
            }
        }))
        .unwrap();

        let effects = state.apply(Action::ConversationSnapshotReceived { snapshot });

        assert_eq!(state.current_conversation_id(), Some("abc"));
        assert_eq!(state.conversation("abc").map(|c| c.title.as_str()), Some("Tides"));
        assert_eq!(state.conversation_messages("abc").len(), 2);

        let batch = effects.iter().find_map(|e| match e {
            Effect::SaveConversationBatch { conversation, messages } => {
                Some((conversation, messages))
            }
            _ => None,
        });
        let (conversation, messages) = batch.unwrap();
        assert_eq!(conversation.id, "abc");
        assert_eq!(messages.len(), 2);

        let loaded = notify_events(&effects)
            .into_iter()
            .any(|e| matches!(e, SessionEvent::ConversationLoaded { conversation_id, .. } if conversation_id == "abc"));
        assert!(loaded);
    }

    #[test]
    fn observed_page_messages_route_by_role() {
        let mut state = SessionState::new();
        state.apply(Action::MessageObserved {
            observed: serde_json::from_value(json!({
                "role": "user",
                "messageId": "u1",
                "message": "Hello",
                "timestamp": 10,
                "providerChatId": "abc"
            }))
            .unwrap(),
        });
        state.apply(Action::MessageObserved {
            observed: serde_json::from_value(json!({
                "role": "assistant",
                "messageId": "a1",
                "message": "Hi there",
                "timestamp": 20,
                "providerChatId": "abc"
            }))
            .unwrap(),
        });
        // Unparseable roles are dropped.
        let effects = state.apply(Action::MessageObserved {
            observed: serde_json::from_value(json!({
                "role": "system",
                "messageId": "s1",
                "message": "rules"
            }))
            .unwrap(),
        });

        assert!(effects.is_empty());
        let roles: Vec<Role> =
            state.conversation_messages("abc").iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[test]
    fn reset_drops_everything() {
        let mut state = SessionState::new();
        state.apply(user_request(Some("u1"), Some("abc"), "Hello"));
        state.apply(user_request(Some("u2"), None, "Orphan"));
        state.apply(Action::ConversationSelected { conversation_id: String::new() });

        state.apply(Action::Reset);
        assert_eq!(state.current_conversation_id(), None);
        assert!(state.conversations().is_empty());
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn navigating_to_a_conversation_adopts_pending_messages() {
        let mut state = SessionState::new();
        state.apply(user_request(Some("u1"), None, "Hello"));
        assert_eq!(state.pending_len(), 1);

        let effects = state.apply(Action::UrlChanged {
            url: "https://chat.example.com/c/abc123".to_owned(),
        });

        assert_eq!(state.pending_len(), 0);
        let messages = state.conversation_messages("abc123");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, "u1");
        assert_eq!(saved_message_ids(&effects), ["u1"]);
    }
}
