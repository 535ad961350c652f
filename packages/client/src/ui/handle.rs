//! Caller-facing handle to a running sync session.

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    config::SyncConfig,
    domain::ConversationId,
    infrastructure::{credential::CredentialProvider, transport::Connector},
    usecase::{
        observer::SyncObserver,
        session::{SessionCommand, SessionEvent, SessionSnapshot, SyncSession},
    },
};

/// Cloneable handle; every clone drives the same session.
///
/// All actions are fire-and-forget. Once the session has stopped they are
/// silently dropped.
#[derive(Debug, Clone)]
pub struct SyncClient {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SyncClient {
    /// Spawn the session on the current tokio runtime.
    pub fn spawn<C>(
        config: SyncConfig,
        connector: C,
        credentials: impl CredentialProvider + Send + 'static,
        observer: impl SyncObserver + Send + 'static,
    ) -> (Self, JoinHandle<()>)
    where
        C: Connector + Send + 'static,
    {
        let session = SyncSession::new(config, connector, credentials, observer);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(SessionSnapshot::default());
        let task = tokio::spawn(session.run(events_rx, snapshots_tx));
        (
            Self {
                events: events_tx,
                snapshots: snapshots_rx,
            },
            task,
        )
    }

    fn post(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Sync session already stopped; event dropped");
        }
    }

    pub fn select_conversation(&self, conversation_id: Option<ConversationId>) {
        self.post(SessionEvent::Select(conversation_id));
    }

    /// Tell the session the credential provider now returns something else.
    pub fn credentials_changed(&self) {
        self.post(SessionEvent::CredentialsChanged);
    }

    pub fn set_visibility(&self, visible: bool) {
        self.post(SessionEvent::Visibility { visible });
    }

    pub fn set_focus(&self, focused: bool) {
        self.post(SessionEvent::Focus { focused });
    }

    pub fn send_message(&self, content: impl Into<String>) {
        self.post(SessionEvent::Command(SessionCommand::SendMessage(
            content.into(),
        )));
    }

    pub fn start_typing(&self) {
        self.post(SessionEvent::Command(SessionCommand::StartTyping));
    }

    pub fn stop_typing(&self) {
        self.post(SessionEvent::Command(SessionCommand::StopTyping));
    }

    pub fn pause(&self) {
        self.post(SessionEvent::Command(SessionCommand::Pause));
    }

    pub fn resume(&self) {
        self.post(SessionEvent::Command(SessionCommand::Resume));
    }

    pub fn set_speed(&self, speed_multiplier: f64) {
        self.post(SessionEvent::Command(SessionCommand::SetSpeed(
            speed_multiplier,
        )));
    }

    /// Tear down the channel and stop the session (unmount).
    pub fn shutdown(&self) {
        self.post(SessionEvent::Shutdown);
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified whenever the published state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.snapshots.borrow().connected
    }

    pub fn is_paused(&self) -> bool {
        self.snapshots.borrow().paused
    }
}
