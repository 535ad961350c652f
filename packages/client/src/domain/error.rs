//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConversationId validation error
    #[error("ConversationId cannot be empty")]
    ConversationIdEmpty,

    /// ConversationId too long error
    #[error("ConversationId cannot exceed {max} characters (got {actual})")]
    ConversationIdTooLong { max: usize, actual: usize },

    /// ParticipantName validation error
    #[error("ParticipantName cannot be empty")]
    ParticipantNameEmpty,

    /// ParticipantName too long error
    #[error("ParticipantName cannot exceed {max} characters (got {actual})")]
    ParticipantNameTooLong { max: usize, actual: usize },

    /// BearerToken validation error
    #[error("BearerToken cannot be empty")]
    BearerTokenEmpty,
}

/// Failures surfaced to the caller's error callback.
///
/// The `Display` text is exactly what the caller receives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No credential was available when a connection attempt started
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Low-level channel error event
    #[error("WebSocket connection error")]
    Transport,

    /// Inbound payload was not a valid frame
    #[error("Failed to parse WebSocket message")]
    MalformedFrame,

    /// `error` frame asserted by the server, carried verbatim
    #[error("{0}")]
    Server(String),
}

impl SyncError {
    /// Build a server error from the optional frame content.
    pub fn server(content: Option<String>) -> Self {
        Self::Server(content.unwrap_or_else(|| "Unknown error".to_string()))
    }
}
