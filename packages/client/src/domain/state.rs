use super::{pause::PauseCoordinator, presence::PresenceTracker, speed::SpeedController};

/// Everything the sync layer knows about the bound conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub presence: PresenceTracker,
    pub pause: PauseCoordinator,
    pub speed: SpeedController,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel lifecycle ended: presence and local pause intent go, the
    /// server's pause flag and the speed stay until the server says otherwise.
    pub fn end_lifecycle(&mut self) {
        self.presence.reset();
        self.pause.reset_intent();
    }
}
