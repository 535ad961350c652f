//! Infrastructure layer: wire format, credentials, and the physical channel.

pub mod credential;
pub mod dto;
pub mod transport;

pub use credential::{CredentialProvider, SharedCredential, StaticCredential};
pub use transport::{ChannelHandle, Connector, TransportEvent, WebSocketConnector, channel_url};
