//! Notice envelope exchanged on the notification bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub const PROTOCOL_VERSION: &str = "1.0";

/// Recipient used for broadcasts
pub const BROADCAST_RECIPIENT: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Broadcast,
    Notification,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Broadcast => "broadcast",
            MessageType::Notification => "notification",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub protocol_version: String,
    pub message_id: String,
    pub sender_id: String,
    pub sender_type: String,
    pub recipient_id: String,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    pub conversation_id: String,
}

impl AgentMessage {
    pub fn is_broadcast(&self) -> bool {
        self.recipient_id == BROADCAST_RECIPIENT
    }
}

/// Builder for a message that has not been published yet
#[derive(Debug, Clone)]
pub struct Draft {
    conversation_id: String,
    sender_id: String,
    sender_type: String,
    recipient_id: String,
    message_type: MessageType,
    payload: Value,
}

impl Draft {
    /// A notification addressed to the orchestrator
    pub fn new(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_type: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            sender_type: sender_type.into(),
            recipient_id: "orchestrator".to_string(),
            message_type: MessageType::Notification,
            payload: Value::Object(Default::default()),
        }
    }

    pub fn to(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = recipient_id.into();
        self
    }

    pub fn kind(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub(crate) fn seal(self) -> AgentMessage {
        AgentMessage {
            protocol_version: PROTOCOL_VERSION.to_string(),
            message_id: new_message_id(),
            sender_id: self.sender_id,
            sender_type: self.sender_type,
            recipient_id: self.recipient_id,
            message_type: self.message_type,
            timestamp: Utc::now(),
            payload: self.payload,
            conversation_id: self.conversation_id,
        }
    }
}

fn new_message_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("msg_{}", &hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_defaults() {
        let message = Draft::new("conv", "scanner", "scanner").seal();
        assert_eq!(message.protocol_version, "1.0");
        assert_eq!(message.recipient_id, "orchestrator");
        assert_eq!(message.message_type, MessageType::Notification);
        assert!(message.message_id.starts_with("msg_"));
        assert_eq!(message.message_id.len(), 16);
    }

    #[test]
    fn test_message_serializes_snake_case_type() {
        let message = Draft::new("conv", "a", "b")
            .kind(MessageType::Broadcast)
            .payload(json!({"k": 1}))
            .seal();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["message_type"], json!("broadcast"));
        assert_eq!(value["payload"]["k"], json!(1));
    }
}
