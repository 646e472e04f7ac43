//! Inbound event types and the `Channel` trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Kind of inbound event. Anything other than `message` bypasses the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Message,
    Other(String),
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        if s == "message" {
            Self::Message
        } else {
            Self::Other(s)
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// One inbound event from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Present for `message` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl InboundEvent {
    /// A text message event.
    pub fn message(conversation_id: &str, user_id: &str, text: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            kind: EventKind::Message,
            text: Some(text.to_string()),
        }
    }

    /// A non-message event such as `conversationUpdate`.
    pub fn other(conversation_id: &str, user_id: &str, kind: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            kind: EventKind::Other(kind.to_string()),
            text: None,
        }
    }
}

/// Stream of inbound events produced by a channel.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A source of inbound events that can deliver replies.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start producing events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Deliver the replies for one event, in order.
    async fn respond(&self, event: &InboundEvent, messages: &[String]) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_event_deserializes() {
        let event: InboundEvent = serde_json::from_value(serde_json::json!({
            "conversation_id": "c1",
            "user_id": "u1",
            "type": "message",
            "text": "Ken"
        }))
        .unwrap();
        assert_eq!(event, InboundEvent::message("c1", "u1", "Ken"));
    }

    #[test]
    fn unknown_type_becomes_other() {
        let event: InboundEvent = serde_json::from_value(serde_json::json!({
            "conversation_id": "c1",
            "user_id": "u1",
            "type": "conversationUpdate"
        }))
        .unwrap();
        assert_eq!(event.kind, EventKind::Other("conversationUpdate".to_string()));
        assert!(event.text.is_none());
    }

    #[test]
    fn kind_serializes_as_plain_string() {
        let json = serde_json::to_value(InboundEvent::other("c1", "u1", "typing")).unwrap();
        assert_eq!(json["type"], "typing");
        assert!(json.get("text").is_none());
    }
}
