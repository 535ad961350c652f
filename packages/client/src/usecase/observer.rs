//! Caller notifications.
//!
//! Every callback is optional: the default implementations do nothing, so a
//! caller only overrides what it wants to hear about.

use tokio::sync::mpsc;

use crate::domain::{ParticipantName, SyncError, ThinkerMessage};

/// Receives notifications from the sync layer, one at a time, in frame order.
pub trait SyncObserver {
    fn on_message(&mut self, _message: &ThinkerMessage) {}

    fn on_typing_start(&mut self, _name: &ParticipantName) {}

    fn on_thinking(&mut self, _name: &ParticipantName, _preview: &str) {}

    fn on_typing_stop(&mut self, _name: &ParticipantName) {}

    fn on_error(&mut self, _error: &SyncError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// One notification, as delivered by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Message(ThinkerMessage),
    TypingStarted(ParticipantName),
    Thinking {
        name: ParticipantName,
        preview: String,
    },
    TypingStopped(ParticipantName),
    Error(SyncError),
}

/// Forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self { tx }
    }

    /// Create an observer together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn forward(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Observer receiver dropped; notification discarded");
        }
    }
}

impl SyncObserver for ChannelObserver {
    fn on_message(&mut self, message: &ThinkerMessage) {
        self.forward(SyncEvent::Message(message.clone()));
    }

    fn on_typing_start(&mut self, name: &ParticipantName) {
        self.forward(SyncEvent::TypingStarted(name.clone()));
    }

    fn on_thinking(&mut self, name: &ParticipantName, preview: &str) {
        self.forward(SyncEvent::Thinking {
            name: name.clone(),
            preview: preview.to_string(),
        });
    }

    fn on_typing_stop(&mut self, name: &ParticipantName) {
        self.forward(SyncEvent::TypingStopped(name.clone()));
    }

    fn on_error(&mut self, error: &SyncError) {
        self.forward(SyncEvent::Error(error.clone()));
    }
}
