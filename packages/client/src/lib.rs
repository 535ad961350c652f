//! Real-time synchronization client for Symposium.
//!
//! Keeps one WebSocket channel open to the conversation the caller is
//! viewing, turns inbound frames into thinker messages and presence
//! updates, and arbitrates pause and speed between the user, tab
//! visibility, and the server.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::SyncConfig;
pub use domain::{BearerToken, ConversationId, SyncError, ThinkerMessage};
pub use infrastructure::{SharedCredential, StaticCredential, WebSocketConnector};
pub use ui::SyncClient;
pub use usecase::{ChannelObserver, SessionSnapshot, SyncEvent, SyncObserver};
