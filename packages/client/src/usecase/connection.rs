//! Connection manager: owns the one channel of the bound conversation.
//!
//! Every connection attempt gets a fresh [`Generation`]. Events coming back
//! from the transport carry the generation they were opened under and are
//! applied only while that generation is still current, so a late callback
//! from a superseded channel can never touch the state of the new one.

use std::time::Duration;

use tokio::time::Instant;
use url::Url;

use crate::{
    domain::{ConversationId, Generation, SyncError},
    infrastructure::{
        credential::CredentialProvider,
        dto::websocket::OutboundFrame,
        transport::{ChannelHandle, Connector, TransportEventSender, channel_url},
    },
};

/// A reconnect waiting for its delay to elapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReconnect {
    pub generation: Generation,
    pub deadline: Instant,
}

pub struct ConnectionManager<C> {
    connector: C,
    credentials: Box<dyn CredentialProvider + Send>,
    server_url: Url,
    reconnect_delay: Duration,
    events: TransportEventSender,

    generation: Generation,
    conversation_id: Option<ConversationId>,
    channel: Option<ChannelHandle>,
    connected: bool,
    pending_reconnect: Option<PendingReconnect>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(
        connector: C,
        credentials: Box<dyn CredentialProvider + Send>,
        server_url: Url,
        reconnect_delay: Duration,
        events: TransportEventSender,
    ) -> Self {
        Self {
            connector,
            credentials,
            server_url,
            reconnect_delay,
            events,
            generation: Generation::default(),
            conversation_id: None,
            channel: None,
            connected: false,
            pending_reconnect: None,
        }
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pending_reconnect(&self) -> Option<PendingReconnect> {
        self.pending_reconnect
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    /// End the current lifecycle: invalidate the generation, close the
    /// channel, and cancel any pending reconnect.
    pub fn teardown(&mut self) {
        self.generation = self.generation.next();
        if let Some(mut channel) = self.channel.take() {
            tracing::debug!("Closing channel {}", channel.generation());
            channel.close();
        }
        self.connected = false;
        self.pending_reconnect = None;
    }

    /// Start a new lifecycle bound to `conversation_id` (or to nothing).
    pub fn bind(&mut self, conversation_id: Option<ConversationId>) -> Result<(), SyncError> {
        self.teardown();
        self.conversation_id = conversation_id;
        match &self.conversation_id {
            Some(id) => {
                tracing::info!("Bound to conversation {}", id);
                self.connect()
            }
            None => {
                tracing::info!("Unbound from conversation");
                Ok(())
            }
        }
    }

    /// Open a channel for the bound conversation under a new generation.
    fn connect(&mut self) -> Result<(), SyncError> {
        let Some(conversation_id) = self.conversation_id.as_ref() else {
            return Ok(());
        };

        let Some(token) = self.credentials.bearer_token() else {
            tracing::warn!("No credential available; not connecting to {}", conversation_id);
            return Err(SyncError::NotAuthenticated);
        };

        let url = channel_url(&self.server_url, conversation_id, &token).map_err(|e| {
            tracing::error!("Cannot build channel URL: {}", e);
            SyncError::Transport
        })?;

        if let Some(mut stale) = self.channel.take() {
            stale.close();
        }
        self.generation = self.generation.next();
        self.connected = false;
        tracing::info!(
            "Opening channel {} for conversation {}",
            self.generation,
            conversation_id
        );
        self.channel = Some(self.connector.open(url, self.generation, self.events.clone()));
        Ok(())
    }

    /// Channel reported open. Returns `false` for stale generations.
    pub fn on_opened(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.connected = true;
        self.pending_reconnect = None;
        tracing::info!("Channel {} connected", generation);
        true
    }

    /// Channel reported closed. Schedules exactly one reconnect.
    pub fn on_closed(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.connected = false;
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        if self.conversation_id.is_some() && self.pending_reconnect.is_none() {
            tracing::info!(
                "Channel {} disconnected; reconnecting in {:?}",
                generation,
                self.reconnect_delay
            );
            self.pending_reconnect = Some(PendingReconnect {
                generation,
                deadline: Instant::now() + self.reconnect_delay,
            });
        }
        true
    }

    /// The reconnect delay for `generation` elapsed.
    ///
    /// Does nothing unless that reconnect is still the pending one.
    pub fn on_reconnect_due(&mut self, generation: Generation) -> Result<bool, SyncError> {
        match self.pending_reconnect {
            Some(pending) if pending.generation == generation && self.is_current(generation) => {
                self.pending_reconnect = None;
                self.connect()?;
                Ok(true)
            }
            _ => {
                tracing::debug!("Ignoring stale reconnect for channel {}", generation);
                Ok(false)
            }
        }
    }

    /// Send one frame if the channel is open; otherwise drop it.
    pub fn send(&self, frame: &OutboundFrame) -> bool {
        let channel = match (&self.channel, self.connected) {
            (Some(channel), true) => channel,
            _ => {
                tracing::debug!("Not connected; dropping {:?} frame", frame.r#type);
                return false;
            }
        };
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize {:?} frame: {}", frame.r#type, e);
                return false;
            }
        };
        tracing::trace!("Channel {} sending: {}", channel.generation(), text);
        channel.send(text)
    }
}
