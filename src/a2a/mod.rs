//! Agent-to-agent notification bus
//!
//! An append-only, conversation-indexed log of notices emitted by agents and
//! the orchestrator. Nothing in the pipeline reads it back to make decisions;
//! it exists for audit and replay.

pub mod message;

pub use message::{AgentMessage, Draft, MessageType, BROADCAST_RECIPIENT, PROTOCOL_VERSION};

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Log {
    messages: Vec<AgentMessage>,
    by_conversation: HashMap<String, Vec<usize>>,
}

impl Log {
    fn reindex(&mut self) {
        self.by_conversation.clear();
        for (idx, message) in self.messages.iter().enumerate() {
            self.by_conversation
                .entry(message.conversation_id.clone())
                .or_default()
                .push(idx);
        }
    }
}

/// Filter for [`NotificationBus::history`]
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub conversation_id: Option<String>,
    pub sender_id: Option<String>,
    pub recipient_id: Option<String>,
}

impl HistoryFilter {
    pub fn conversation(id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn sender(mut self, id: impl Into<String>) -> Self {
        self.sender_id = Some(id.into());
        self
    }

    pub fn recipient(mut self, id: impl Into<String>) -> Self {
        self.recipient_id = Some(id.into());
        self
    }

    fn matches(&self, message: &AgentMessage) -> bool {
        self.sender_id
            .as_deref()
            .map_or(true, |s| s == message.sender_id)
            && self
                .recipient_id
                .as_deref()
                .map_or(true, |r| r == message.recipient_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub message_types: BTreeMap<MessageType, usize>,
    /// Senders and direct recipients, broadcasts excluded
    pub agents_involved: Vec<String>,
    pub duration_seconds: f64,
}

/// Shared notification log
#[derive(Default)]
pub struct NotificationBus {
    log: Mutex<Log>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a message to the log
    pub fn publish(&self, draft: Draft) -> AgentMessage {
        let message = draft.seal();
        debug!(
            "A2A {} {} -> {} ({})",
            message.message_type, message.sender_id, message.recipient_id, message.conversation_id
        );

        let mut log = self.lock();
        let idx = log.messages.len();
        log.by_conversation
            .entry(message.conversation_id.clone())
            .or_default()
            .push(idx);
        log.messages.push(message.clone());
        message
    }

    /// Publish to every participant
    pub fn broadcast(
        &self,
        conversation_id: &str,
        sender_id: &str,
        sender_type: &str,
        payload: Value,
    ) -> AgentMessage {
        self.publish(
            Draft::new(conversation_id, sender_id, sender_type)
                .to(BROADCAST_RECIPIENT)
                .kind(MessageType::Broadcast)
                .payload(payload),
        )
    }

    /// Reply to `original`, tagging the payload with `in_response_to`
    pub fn respond(
        &self,
        original: &AgentMessage,
        sender_id: &str,
        sender_type: &str,
        payload: Value,
    ) -> AgentMessage {
        let payload = match payload {
            Value::Object(mut map) => {
                map.insert(
                    "in_response_to".to_string(),
                    Value::String(original.message_id.clone()),
                );
                Value::Object(map)
            }
            other => serde_json::json!({
                "data": other,
                "in_response_to": original.message_id,
            }),
        };

        self.publish(
            Draft::new(original.conversation_id.clone(), sender_id, sender_type)
                .to(original.sender_id.clone())
                .kind(MessageType::Response)
                .payload(payload),
        )
    }

    /// Messages matching `filter`, in publication order
    pub fn history(&self, filter: &HistoryFilter) -> Vec<AgentMessage> {
        let log = self.lock();
        match &filter.conversation_id {
            Some(id) => log
                .by_conversation
                .get(id)
                .into_iter()
                .flatten()
                .map(|&idx| &log.messages[idx])
                .filter(|m| filter.matches(m))
                .cloned()
                .collect(),
            None => log
                .messages
                .iter()
                .filter(|m| filter.matches(m))
                .cloned()
                .collect(),
        }
    }

    pub fn conversation_stats(&self, conversation_id: &str) -> ConversationStats {
        let messages = self.history(&HistoryFilter::conversation(conversation_id));
        if messages.is_empty() {
            return ConversationStats::default();
        }

        let mut message_types = BTreeMap::new();
        let mut agents = BTreeSet::new();
        for message in &messages {
            *message_types.entry(message.message_type).or_insert(0) += 1;
            agents.insert(message.sender_id.clone());
            if !message.is_broadcast() {
                agents.insert(message.recipient_id.clone());
            }
        }

        let first = messages.iter().map(|m| m.timestamp).min();
        let last = messages.iter().map(|m| m.timestamp).max();
        let duration_seconds = match (first, last) {
            (Some(first), Some(last)) => {
                (last - first).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0
            }
            _ => 0.0,
        };

        ConversationStats {
            total_messages: messages.len(),
            message_types,
            agents_involved: agents.into_iter().collect(),
            duration_seconds,
        }
    }

    /// Drop one conversation, or everything when `conversation_id` is `None`
    pub fn clear(&self, conversation_id: Option<&str>) {
        let mut log = self.lock();
        match conversation_id {
            Some(id) => {
                log.messages.retain(|m| m.conversation_id != id);
                log.reindex();
            }
            None => {
                log.messages.clear();
                log.by_conversation.clear();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
