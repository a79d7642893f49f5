//! Entry points for raw intercepted JSON. Payloads are validated into typed
//! events here; anything that does not parse is logged and dropped.

use skein_domain::{Action, InterceptEvent, ObservedMessage, conversation_id_from_payload};

/// Maps one intercepted network payload to a session action. Returns `None`
/// for unrecognized or malformed payloads.
pub fn action_from_network_payload(payload: serde_json::Value) -> Option<Action> {
    let conversation_id = conversation_id_from_payload(&payload);
    let event: InterceptEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(
                error = %err,
                conversation_id = conversation_id.as_deref().unwrap_or("unknown"),
                "dropping unrecognized network payload"
            );
            return None;
        }
    };
    Some(match event {
        InterceptEvent::ChatCompletion { request_body, response_body, is_streaming } => {
            Action::ChatCompletionIntercepted {
                request: request_body,
                response: response_body,
                is_streaming,
            }
        }
        InterceptEvent::AssistantResponse {
            message_id,
            content,
            conversation_id,
            model,
            create_time,
            parent_message_id,
        } => Action::AssistantResponseAssembled {
            message_id,
            content,
            conversation_id,
            model,
            create_time,
            parent_message_id,
        },
        InterceptEvent::SpecificConversation { response_body } => {
            Action::ConversationSnapshotReceived { snapshot: response_body }
        }
    })
}

/// Maps one DOM-observed message payload to a session action.
pub fn action_from_dom_payload(payload: serde_json::Value) -> Option<Action> {
    let observed: ObservedMessage = match serde_json::from_value(payload) {
        Ok(observed) => observed,
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed observed message");
            return None;
        }
    };
    Some(Action::MessageObserved { observed })
}
