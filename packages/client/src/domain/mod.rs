//! Domain layer for the synchronization client.
//!
//! This module contains the state owned by one live conversation
//! (presence, pause arbitration, speed) and is independent of the
//! wire format and of the transport.

pub mod entity;
pub mod error;
pub mod pause;
pub mod presence;
pub mod speed;
pub mod state;
pub mod value_object;

pub use entity::{SenderType, ThinkerMessage};
pub use error::{SyncError, ValueObjectError};
pub use pause::{PauseCoordinator, PauseIntent, PauseRequest};
pub use presence::PresenceTracker;
pub use speed::SpeedController;
pub use state::SyncState;
pub use value_object::{BearerToken, ConversationId, Generation, ParticipantName, SpeedMultiplier};
