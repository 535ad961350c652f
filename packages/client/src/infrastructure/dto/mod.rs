//! Data transfer objects exchanged with the backend.

pub mod websocket;

pub use websocket::{InboundFrame, InboundFrameType, OutboundFrame, OutboundFrameType};
