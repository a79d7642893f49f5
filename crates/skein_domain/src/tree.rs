//! Conversation-tree snapshot extraction.
//!
//! A snapshot interleaves tool-call nodes between a user turn and its
//! assistant answer. Tool nodes are never materialized as standalone
//! messages; they contribute their names to the assistant's tool set, and
//! parent resolution walks over them to the owning user turn.

use crate::intercept::{ConversationSnapshot, NodeContent, SNAPSHOT_ROOT_NODE_ID, SnapshotNode};
use crate::time::unix_ms_from_create_time;
use crate::{Conversation, Message, Role, UNKNOWN_MODEL};
use std::collections::HashMap;

const DEFAULT_CONVERSATION_TITLE: &str = "Conversation";
const UNKNOWN_TOOL_NAME: &str = "unknown-tool";

#[derive(Clone, Debug)]
pub struct ExtractedConversation {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

fn node_role(node: &SnapshotNode) -> Option<&str> {
    node.message.as_ref()?.author.as_ref()?.role.as_deref()
}

fn content_text(content: Option<&NodeContent>) -> String {
    let Some(content) = content else {
        return String::new();
    };
    match content.content_type.as_deref() {
        Some("text") => match content.parts.as_ref() {
            Some(serde_json::Value::Array(parts)) => parts
                .iter()
                .filter_map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => String::new(),
        },
        Some("multimodal_text") => {
            let Some(serde_json::Value::Array(parts)) = content.parts.as_ref() else {
                return String::new();
            };
            let mut text = String::new();
            for part in parts {
                if let Some(piece) = part.as_str() {
                    text.push_str(piece);
                } else if let Some(piece) = part.get("text").and_then(|t| t.as_str()) {
                    text.push_str(piece);
                }
                // Other part kinds (images, audio) carry no text.
            }
            text
        }
        _ => String::new(),
    }
}

/// Walks a snapshot once (plus a bounded backfill pass) and produces the
/// conversation summary and its canonical messages, sorted by timestamp.
pub fn extract_conversation(
    snapshot: &ConversationSnapshot,
    now_unix_ms: u64,
) -> ExtractedConversation {
    // Index pass: validate nodes in payload order, invert parent->children
    // edges, cache model slugs.
    let mut order: Vec<&str> = Vec::with_capacity(snapshot.mapping.len());
    let mut nodes: HashMap<&str, SnapshotNode> = HashMap::with_capacity(snapshot.mapping.len());
    let mut child_to_parent: HashMap<String, &str> = HashMap::new();
    let mut model_by_node: HashMap<&str, String> = HashMap::new();

    for (node_id, raw) in &snapshot.mapping {
        let Ok(node) = serde_json::from_value::<SnapshotNode>(raw.clone()) else {
            continue;
        };
        for child in &node.children {
            child_to_parent.insert(child.clone(), node_id.as_str());
        }
        if let Some(model) = node
            .message
            .as_ref()
            .and_then(|m| m.metadata.as_ref())
            .and_then(|m| m.model_slug.clone())
        {
            model_by_node.insert(node_id.as_str(), model);
        }
        order.push(node_id.as_str());
        nodes.insert(node_id.as_str(), node);
    }

    // Tool attribution against the now-complete edge map.
    let mut tools_by_parent: HashMap<&str, Vec<String>> = HashMap::new();
    for node_id in &order {
        let node = &nodes[node_id];
        if node_role(node) != Some("tool") {
            continue;
        }
        let Some(parent_id) = child_to_parent.get(*node_id) else {
            continue;
        };
        let name = node
            .message
            .as_ref()
            .and_then(|m| m.author.as_ref())
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_TOOL_NAME.to_owned());
        let tools = tools_by_parent.entry(*parent_id).or_default();
        if !tools.contains(&name) {
            tools.push(name);
        }
    }

    // Extraction pass: only user and assistant nodes become messages.
    let mut messages: Vec<Message> = Vec::new();
    for node_id in &order {
        if *node_id == SNAPSHOT_ROOT_NODE_ID {
            continue;
        }
        let node = &nodes[node_id];
        let Some(raw_message) = node.message.as_ref() else {
            continue;
        };
        let Some(role) = node_role(node).and_then(Role::parse) else {
            continue;
        };
        let content = content_text(raw_message.content.as_ref());
        if content.trim().is_empty() {
            continue;
        }

        // Tool names attach to assistant messages only.
        let mut parent_message_id = None;
        let mut tools = Vec::new();
        if role == Role::Assistant {
            tools = tools_by_parent.get(*node_id).cloned().unwrap_or_default();
            let explicit = raw_message
                .metadata
                .as_ref()
                .and_then(|m| m.parent_id.clone())
                .filter(|id| !id.is_empty());

            // Walk toward the owning user turn; intervening tool nodes are
            // skipped for parentage but contribute their names.
            let mut user_ancestor = None;
            let mut cursor = child_to_parent.get(*node_id);
            let mut hops = 0usize;
            while let Some(ancestor_id) = cursor {
                hops += 1;
                if hops > nodes.len() {
                    break; // malformed mapping with a cycle
                }
                match nodes.get(ancestor_id).map(|n| (n, node_role(n))) {
                    Some((_, Some("user"))) => {
                        user_ancestor = Some((*ancestor_id).to_owned());
                        break;
                    }
                    Some((ancestor, Some("tool"))) => {
                        let name = ancestor
                            .message
                            .as_ref()
                            .and_then(|m| m.author.as_ref())
                            .and_then(|a| a.name.clone())
                            .unwrap_or_else(|| UNKNOWN_TOOL_NAME.to_owned());
                        if !tools.contains(&name) {
                            tools.push(name);
                        }
                    }
                    _ => {}
                }
                cursor = child_to_parent.get(*ancestor_id);
            }
            parent_message_id = explicit.or(user_ancestor);
        }

        messages.push(Message {
            message_id: (*node_id).to_owned(),
            conversation_id: snapshot.conversation_id.clone(),
            role,
            content,
            model: model_by_node
                .get(*node_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_MODEL.to_owned()),
            timestamp_unix_ms: unix_ms_from_create_time(raw_message.create_time, now_unix_ms),
            parent_message_id,
            tools,
        });
    }

    // Model backfill: a user turn's model selection is only visible on its
    // assistant reply.
    for idx in 0..messages.len() {
        if messages[idx].role != Role::User || messages[idx].model != UNKNOWN_MODEL {
            continue;
        }
        let user_id = messages[idx].message_id.clone();
        let reply_model = messages
            .iter()
            .find(|m| {
                m.role == Role::Assistant
                    && m.parent_message_id.as_deref() == Some(user_id.as_str())
                    && m.model != UNKNOWN_MODEL
            })
            .map(|m| m.model.clone());
        if let Some(model) = reply_model {
            messages[idx].model = model;
        }
    }

    messages.sort_by_key(|m| m.timestamp_unix_ms);

    let title = snapshot
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_owned());
    let last_message_time_unix_ms = messages
        .iter()
        .map(|m| m.timestamp_unix_ms)
        .max()
        .unwrap_or(now_unix_ms);

    ExtractedConversation {
        conversation: Conversation {
            id: snapshot.conversation_id.clone(),
            title,
            last_message_time_unix_ms,
        },
        messages,
    }
}
