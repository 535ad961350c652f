//! WebSocket frame DTOs for the thinker chat protocol.
//!
//! One JSON object per WebSocket text message. The backend serializes
//! absent optional fields as `null`, so every optional field accepts both a
//! missing key and an explicit `null`.

use serde::{Deserialize, Serialize};

use crate::domain::ConversationId;

/// Inbound (server -> client) frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundFrameType {
    Message,
    ThinkerTyping,
    ThinkerThinking,
    ThinkerStoppedTyping,
    Paused,
    Resumed,
    SpeedChanged,
    Error,
    UserJoined,
    UserLeft,
    /// Any kind this client does not know about yet
    #[serde(other)]
    Unknown,
}

/// Frame received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub r#type: InboundFrameType,
    pub conversation_id: Option<String>,
    pub content: Option<String>,
    pub sender_name: Option<String>,
    pub sender_type: Option<String>,
    pub message_id: Option<String>,
    /// ISO 8601
    pub timestamp: Option<String>,
    pub cost: Option<f64>,
    pub speed_multiplier: Option<f64>,
}

impl InboundFrame {
    /// Parse one text payload.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether the frame is tagged with a conversation other than `bound`.
    ///
    /// Frames without a conversation id (the backend's `error` frames) are
    /// never considered foreign.
    pub fn is_foreign_to(&self, bound: &ConversationId) -> bool {
        self.conversation_id
            .as_deref()
            .is_some_and(|id| id != bound.as_str())
    }
}

/// Outbound (client -> server) frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundFrameType {
    UserMessage,
    TypingStart,
    TypingStop,
    Pause,
    Resume,
    SetSpeed,
}

/// Frame sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub r#type: OutboundFrameType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f64>,
}

impl OutboundFrame {
    fn bare(r#type: OutboundFrameType, conversation_id: &ConversationId) -> Self {
        Self {
            r#type,
            conversation_id: Some(conversation_id.as_str().to_string()),
            content: None,
            speed_multiplier: None,
        }
    }

    pub fn user_message(conversation_id: &ConversationId, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::bare(OutboundFrameType::UserMessage, conversation_id)
        }
    }

    pub fn typing_start(conversation_id: &ConversationId) -> Self {
        Self::bare(OutboundFrameType::TypingStart, conversation_id)
    }

    pub fn typing_stop(conversation_id: &ConversationId) -> Self {
        Self::bare(OutboundFrameType::TypingStop, conversation_id)
    }

    pub fn pause(conversation_id: &ConversationId) -> Self {
        Self::bare(OutboundFrameType::Pause, conversation_id)
    }

    pub fn resume(conversation_id: &ConversationId) -> Self {
        Self::bare(OutboundFrameType::Resume, conversation_id)
    }

    pub fn set_speed(conversation_id: &ConversationId, speed_multiplier: f64) -> Self {
        Self {
            speed_multiplier: Some(speed_multiplier),
            ..Self::bare(OutboundFrameType::SetSpeed, conversation_id)
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
