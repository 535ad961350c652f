//! Physical channel abstraction.
//!
//! A [`Connector`] opens one channel per connection attempt and reports
//! everything that happens on it as [`TransportEvent`]s tagged with the
//! [`Generation`] the attempt was opened under. The caller owns the returned
//! [`ChannelHandle`] and is the only one able to write to or close the channel.

mod websocket;

pub use websocket::WebSocketConnector;

use thiserror::Error;
use tokio::{sync::mpsc, task::AbortHandle};
use url::Url;

use crate::domain::{BearerToken, ConversationId, Generation};

/// Lifecycle and data events of one channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Opened,
    /// One inbound text payload
    Frame(String),
    /// Low-level error; a `Closed` event follows separately if the channel dies
    Error(String),
    /// Channel is gone, cleanly or not
    Closed { code: Option<u16>, reason: String },
}

/// Where connectors deliver events.
pub type TransportEventSender = mpsc::UnboundedSender<(Generation, TransportEvent)>;

/// Errors building the channel URL
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("server URL cannot carry a path: {0}")]
    CannotBeABase(String),
}

/// Opens channels.
pub trait Connector {
    /// Start opening a channel to `url`.
    ///
    /// Must not block. Every event of the new channel is sent on `events`
    /// tagged with `generation`.
    fn open(&self, url: Url, generation: Generation, events: TransportEventSender)
    -> ChannelHandle;
}

/// Write side and kill switch of one open (or opening) channel.
#[derive(Debug)]
pub struct ChannelHandle {
    generation: Generation,
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<AbortHandle>,
}

impl ChannelHandle {
    pub fn new(
        generation: Generation,
        outbound: mpsc::UnboundedSender<String>,
        task: Option<AbortHandle>,
    ) -> Self {
        Self {
            generation,
            outbound: Some(outbound),
            task,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Queue one text payload for the writer. Returns `false` if the channel
    /// is already closed.
    pub fn send(&self, text: String) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(text).is_ok())
    }

    /// Close the channel. Closing twice is a no-op.
    pub fn close(&mut self) {
        // Dropping the sender lets the writer flush a close frame.
        self.outbound.take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_none()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build `{server}/ws/{conversation_id}?token={token}`.
///
/// `http`/`https` server URLs are mapped to `ws`/`wss`.
pub fn channel_url(
    server: &Url,
    conversation_id: &ConversationId,
    token: &BearerToken,
) -> Result<Url, TransportError> {
    let mut url = server.clone();
    let websocket_scheme = match server.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = websocket_scheme {
        // Switching between special schemes always succeeds.
        let _ = url.set_scheme(scheme);
    }

    url.path_segments_mut()
        .map_err(|()| TransportError::CannotBeABase(server.to_string()))?
        .pop_if_empty()
        .push("ws")
        .push(conversation_id.as_str());
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("token", token.as_str());
    Ok(url)
}
