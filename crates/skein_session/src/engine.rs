//! The session engine: a single task owning [`SessionState`], fed commands
//! over a channel, broadcasting events to subscribers and running persistence
//! effects off-loop.

use crate::boundary::{action_from_dom_payload, action_from_network_payload};
use crate::gateway::{
    PersistenceGateway, batch_save_request, chat_save_request, message_save_request,
};
use anyhow::Context as _;
use skein_domain::{Action, Conversation, Effect, Message, SessionEvent, SessionState};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Feeds a page navigation; `/c/<id>` paths switch the current
    /// conversation.
    pub async fn navigation(&self, url: impl Into<String>) -> anyhow::Result<()> {
        self.dispatch(Action::UrlChanged { url: url.into() }).await
    }

    /// Feeds one raw intercepted network payload. Unrecognized payloads are
    /// dropped silently; dropping is not an error.
    pub async fn network_payload(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        match action_from_network_payload(payload) {
            Some(action) => self.dispatch(action).await,
            None => Ok(()),
        }
    }

    /// Feeds one message observed in the page DOM.
    pub async fn dom_payload(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        match action_from_dom_payload(payload) {
            Some(action) => self.dispatch(action).await,
            None => Ok(()),
        }
    }

    /// Switches the current conversation without a navigation event.
    pub async fn select_conversation(
        &self,
        conversation_id: impl Into<String>,
    ) -> anyhow::Result<()> {
        self.dispatch(Action::ConversationSelected { conversation_id: conversation_id.into() })
            .await
    }

    /// Drops all in-memory session state.
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.dispatch(Action::Reset).await
    }

    /// Stops the session task. Commands sent after shutdown fail with
    /// "session unavailable".
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .context("session unavailable")
    }

    pub async fn current_conversation_id(&self) -> anyhow::Result<Option<String>> {
        self.query(|reply| SessionCommand::GetCurrentConversationId { reply }).await
    }

    pub async fn conversation_messages(
        &self,
        conversation_id: impl Into<String>,
    ) -> anyhow::Result<Vec<Message>> {
        let conversation_id = conversation_id.into();
        self.query(|reply| SessionCommand::GetConversationMessages { conversation_id, reply })
            .await
    }

    pub async fn conversation(
        &self,
        conversation_id: impl Into<String>,
    ) -> anyhow::Result<Option<Conversation>> {
        let conversation_id = conversation_id.into();
        self.query(|reply| SessionCommand::GetConversation { conversation_id, reply }).await
    }

    pub async fn conversations(&self) -> anyhow::Result<Vec<Conversation>> {
        self.query(|reply| SessionCommand::GetConversations { reply }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn dispatch(&self, action: Action) -> anyhow::Result<()> {
        self.tx
            .send(SessionCommand::Dispatch { action })
            .await
            .context("session unavailable")
    }

    async fn query<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(command(tx)).await.context("session unavailable")?;
        rx.await.context("session stopped")
    }
}

enum SessionCommand {
    Dispatch {
        action: Action,
    },
    Shutdown,
    GetCurrentConversationId {
        reply: oneshot::Sender<Option<String>>,
    },
    GetConversationMessages {
        conversation_id: String,
        reply: oneshot::Sender<Vec<Message>>,
    },
    GetConversation {
        conversation_id: String,
        reply: oneshot::Sender<Option<Conversation>>,
    },
    GetConversations {
        reply: oneshot::Sender<Vec<Conversation>>,
    },
}

pub struct Session {
    state: SessionState,
    gateway: Arc<dyn PersistenceGateway>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Spawns the session task. The task exits once every handle is dropped.
    pub fn start(gateway: Arc<dyn PersistenceGateway>) -> SessionHandle {
        let (tx, mut rx) = mpsc::channel::<SessionCommand>(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel::<SessionEvent>(CHANNEL_CAPACITY);

        let mut session = Self {
            state: SessionState::new(),
            gateway,
            events: events.clone(),
        };

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                if session.handle(cmd).await.is_break() {
                    break;
                }
            }
        });

        SessionHandle { tx, events }
    }

    async fn handle(&mut self, cmd: SessionCommand) -> ControlFlow<()> {
        match cmd {
            SessionCommand::Shutdown => return ControlFlow::Break(()),
            SessionCommand::Dispatch { action } => {
                tracing::debug!(?action, "applying session action");
                for effect in self.state.apply(action) {
                    self.run_effect(effect).await;
                }
            }
            SessionCommand::GetCurrentConversationId { reply } => {
                let _ = reply.send(self.state.current_conversation_id().map(str::to_owned));
            }
            SessionCommand::GetConversationMessages { conversation_id, reply } => {
                let _ = reply.send(self.state.conversation_messages(&conversation_id).to_vec());
            }
            SessionCommand::GetConversation { conversation_id, reply } => {
                let _ = reply.send(self.state.conversation(&conversation_id).cloned());
            }
            SessionCommand::GetConversations { reply } => {
                let _ = reply.send(self.state.conversations());
            }
        }
        ControlFlow::Continue(())
    }

    /// Persistence failures are logged and swallowed: the in-memory store is
    /// the source of truth and is never rolled back on a failed save.
    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SaveMessage { message } => {
                let request = message_save_request(&message);
                self.persist(move |gateway| gateway.save_message(&request)).await;
            }
            Effect::SaveConversation { conversation } => {
                let request = chat_save_request(&conversation);
                self.persist(move |gateway| gateway.save_chat(&request)).await;
            }
            Effect::SaveConversationBatch { conversation, messages } => {
                let request = batch_save_request(&conversation, &messages);
                self.persist(move |gateway| gateway.save_batch(&request)).await;
            }
            Effect::Notify { event } => {
                let _ = self.events.send(event);
            }
        }
    }

    async fn persist<F>(&self, call: F)
    where
        F: FnOnce(&dyn PersistenceGateway) -> anyhow::Result<()> + Send + 'static,
    {
        let gateway = self.gateway.clone();
        match tokio::task::spawn_blocking(move || call(gateway.as_ref())).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(error = %err, "persistence call failed"),
            Err(err) => tracing::error!(error = %err, "persistence task panicked"),
        }
    }
}
