//! Core domain models delivered to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::value_object::ConversationId;

/// Kind of participant that authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    User,
    Thinker,
    System,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Thinker => "thinker",
            Self::System => "system",
        }
    }
}

impl FromStr for SenderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "thinker" => Ok(Self::Thinker),
            "system" => Ok(Self::System),
            other => Err(format!("unknown sender type: {other}")),
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized utterance from a thinker, normalized from a `message` frame
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkerMessage {
    /// Message identifier assigned by the backend
    pub id: String,
    /// Conversation the message belongs to
    pub conversation_id: ConversationId,
    /// Always `SenderType::Thinker` for messages delivered by the dispatcher
    pub sender_type: SenderType,
    /// Display name of the thinker, when the backend supplied one
    pub sender_name: Option<String>,
    /// Message body (empty when the frame carried no content)
    pub content: String,
    /// Monetary cost of generating the message
    pub cost: Option<f64>,
    /// When the message was produced
    pub timestamp: DateTime<Utc>,
}
