//! UseCase: 会話 1 つ分の同期レイヤー
//!
//! 接続管理・フレーム処理・presence・一時停止の調停をまとめ、イベントを
//! 1 つずつ順番に処理する。ハンドラが同時に走ることはないので、状態は
//! すべてこの構造体が排他的に所有し、ロックは不要。
//!
//! イベントの入口は 3 つ:
//! - 呼び出し元からの [`SessionEvent`]（会話選択・表示状態・ユーザー操作）
//! - トランスポートからの世代付き [`TransportEvent`]
//! - 再接続タイマーの期限

use std::collections::{BTreeMap, BTreeSet};

use tokio::{
    sync::{mpsc, watch},
    time::sleep_until,
};

use crate::{
    config::SyncConfig,
    domain::{
        ConversationId, Generation, ParticipantName, PauseRequest, SpeedMultiplier, SyncError,
        SyncState,
    },
    infrastructure::{
        credential::CredentialProvider,
        dto::websocket::OutboundFrame,
        transport::{Connector, TransportEvent},
    },
    usecase::{
        connection::{ConnectionManager, PendingReconnect},
        dispatch_frame::DispatchFrameUseCase,
        observer::SyncObserver,
    },
};

/// User actions that produce outbound frames
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SendMessage(String),
    StartTyping,
    StopTyping,
    Pause,
    Resume,
    SetSpeed(f64),
}

/// Inputs from the caller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Conversation selection changed (`None` = nothing selected)
    Select(Option<ConversationId>),
    /// The credential changed (login, refresh, logout); restarts the lifecycle
    CredentialsChanged,
    /// Document visibility changed
    Visibility { visible: bool },
    /// Window focus changed
    Focus { focused: bool },
    Command(SessionCommand),
    /// Unmount: tear everything down and stop
    Shutdown,
}

/// Everything the caller can render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub conversation_id: Option<ConversationId>,
    pub connected: bool,
    pub paused: bool,
    pub speed: SpeedMultiplier,
    pub typing: BTreeSet<ParticipantName>,
    pub thinking: BTreeMap<ParticipantName, String>,
}

pub struct SyncSession<C> {
    connection: ConnectionManager<C>,
    state: SyncState,
    observer: Box<dyn SyncObserver + Send>,
    transport_rx: mpsc::UnboundedReceiver<(Generation, TransportEvent)>,
}

impl<C: Connector> SyncSession<C> {
    pub fn new(
        config: SyncConfig,
        connector: C,
        credentials: impl CredentialProvider + Send + 'static,
        observer: impl SyncObserver + Send + 'static,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let connection = ConnectionManager::new(
            connector,
            Box::new(credentials),
            config.server_url,
            config.reconnect_delay,
            transport_tx,
        );
        Self {
            connection,
            state: SyncState::new(),
            observer: Box::new(observer),
            transport_rx,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation_id: self.connection.conversation_id().cloned(),
            connected: self.connection.is_connected(),
            paused: self.state.pause.is_paused(),
            speed: self.state.speed.current(),
            typing: self.state.presence.typing().clone(),
            thinking: self.state.presence.thinking().clone(),
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.connection.generation()
    }

    pub fn pending_reconnect(&self) -> Option<PendingReconnect> {
        self.connection.pending_reconnect()
    }

    /// Handle one caller event. Returns `false` once the session is shut down.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Select(conversation_id) => self.select(conversation_id),
            SessionEvent::CredentialsChanged => {
                let current = self.connection.conversation_id().cloned();
                self.restart(current);
            }
            SessionEvent::Visibility { visible } | SessionEvent::Focus { focused: visible } => {
                self.set_foreground(visible)
            }
            SessionEvent::Command(command) => self.command(command),
            SessionEvent::Shutdown => {
                self.restart(None);
                return false;
            }
        }
        true
    }

    fn select(&mut self, conversation_id: Option<ConversationId>) {
        if self.connection.conversation_id() == conversation_id.as_ref() {
            tracing::debug!("Conversation unchanged; keeping current channel");
            return;
        }
        self.restart(conversation_id);
    }

    /// End the current lifecycle and start one bound to `conversation_id`.
    fn restart(&mut self, conversation_id: Option<ConversationId>) {
        self.state.end_lifecycle();
        if let Err(error) = self.connection.bind(conversation_id) {
            self.observer.on_error(&error);
        }
    }

    fn set_foreground(&mut self, foreground: bool) {
        let request = if foreground {
            self.state.pause.foreground()
        } else {
            self.state.pause.background()
        };
        if let Some(request) = request {
            tracing::debug!(
                "Page {}; requesting {:?}",
                if foreground { "foregrounded" } else { "backgrounded" },
                request
            );
            self.send_pause_request(request);
        }
    }

    fn command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendMessage(content) => {
                self.send_with(|id| OutboundFrame::user_message(id, content));
            }
            SessionCommand::StartTyping => {
                self.send_with(OutboundFrame::typing_start);
            }
            SessionCommand::StopTyping => {
                self.send_with(OutboundFrame::typing_stop);
            }
            SessionCommand::Pause => {
                let request = self.state.pause.request_pause();
                self.send_pause_request(request);
            }
            SessionCommand::Resume => {
                let request = self.state.pause.request_resume();
                self.send_pause_request(request);
            }
            SessionCommand::SetSpeed(speed) => {
                self.send_with(|id| OutboundFrame::set_speed(id, speed));
            }
        }
    }

    fn send_pause_request(&mut self, request: PauseRequest) -> bool {
        match request {
            PauseRequest::Pause => self.send_with(OutboundFrame::pause),
            PauseRequest::Resume => self.send_with(OutboundFrame::resume),
        }
    }

    fn send_with(&mut self, build: impl FnOnce(&ConversationId) -> OutboundFrame) -> bool {
        match self.connection.conversation_id() {
            Some(id) => {
                let frame = build(id);
                self.connection.send(&frame)
            }
            None => false,
        }
    }

    /// Handle one transport event. Stale generations are dropped untouched.
    pub fn handle_transport(&mut self, generation: Generation, event: TransportEvent) {
        if !self.connection.is_current(generation) {
            tracing::debug!(
                "Dropping {:?} from stale channel {} (current {})",
                event,
                generation,
                self.connection.generation()
            );
            return;
        }

        match event {
            TransportEvent::Opened => {
                self.connection.on_opened(generation);
            }
            TransportEvent::Frame(raw) => {
                let Some(bound) = self.connection.conversation_id() else {
                    return;
                };
                let outcome =
                    DispatchFrameUseCase::new(&mut self.state, self.observer.as_mut())
                        .execute(bound, &raw);
                tracing::trace!("Frame on channel {}: {:?}", generation, outcome);
            }
            TransportEvent::Error(detail) => {
                tracing::warn!("Channel {} transport error: {}", generation, detail);
                self.observer.on_error(&SyncError::Transport);
            }
            TransportEvent::Closed { code, reason } => {
                tracing::debug!(
                    "Channel {} closed (code {:?}, reason {:?})",
                    generation,
                    code,
                    reason
                );
                self.connection.on_closed(generation);
            }
        }
    }

    /// The reconnect timer scheduled under `generation` fired.
    pub fn reconnect_due(&mut self, generation: Generation) {
        if let Err(error) = self.connection.on_reconnect_due(generation) {
            self.observer.on_error(&error);
        }
    }

    /// Handle every transport event already queued, without waiting.
    pub fn drain_transport(&mut self) {
        while let Ok((generation, event)) = self.transport_rx.try_recv() {
            self.handle_transport(generation, event);
        }
    }

    /// Drive the session until [`SessionEvent::Shutdown`] or until every
    /// event sender is dropped, publishing a snapshot after each event.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) {
        publish(&snapshots, self.snapshot());
        loop {
            let pending = self.connection.pending_reconnect();
            tokio::select! {
                event = events.recv() => {
                    let keep_running = match event {
                        Some(event) => self.handle(event),
                        None => self.handle(SessionEvent::Shutdown),
                    };
                    if !keep_running {
                        break;
                    }
                }
                Some((generation, event)) = self.transport_rx.recv() => {
                    self.handle_transport(generation, event);
                }
                () = wait_for(pending) => {
                    if let Some(pending) = pending {
                        self.reconnect_due(pending.generation);
                    }
                }
            }
            publish(&snapshots, self.snapshot());
        }
        publish(&snapshots, self.snapshot());
        tracing::debug!("Sync session stopped");
    }
}

async fn wait_for(pending: Option<PendingReconnect>) {
    match pending {
        Some(pending) => sleep_until(pending.deadline).await,
        None => std::future::pending().await,
    }
}

fn publish(snapshots: &watch::Sender<SessionSnapshot>, snapshot: SessionSnapshot) {
    snapshots.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
