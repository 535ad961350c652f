//! Pause arbitration.
//!
//! Three things can want the conversation paused: the user pressing the
//! control, the tab/window going to the background, and the server. Only the
//! server decides; the coordinator only decides whether this client is
//! allowed to *ask* for a pause or resume, so that automatic requests never
//! contradict an explicit user choice and are never sent twice.

/// Why this client last asked for a pause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PauseIntent {
    /// No local pause request is in effect
    #[default]
    Running,
    /// The user explicitly paused; visibility changes must not undo it
    UserPaused,
    /// This client paused because the page went to the background
    AutoPaused,
}

/// Outbound request the coordinator wants sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseRequest {
    Pause,
    Resume,
}

/// Local intent crossed with the authoritative server flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseCoordinator {
    intent: PauseIntent,
    server_paused: bool,
}

impl PauseCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value exposed to the UI. Always the server's last word.
    pub fn is_paused(&self) -> bool {
        self.server_paused
    }

    pub fn intent(&self) -> PauseIntent {
        self.intent
    }

    /// User pressed pause.
    pub fn request_pause(&mut self) -> PauseRequest {
        self.intent = PauseIntent::UserPaused;
        PauseRequest::Pause
    }

    /// User pressed resume.
    pub fn request_resume(&mut self) -> PauseRequest {
        self.intent = PauseIntent::Running;
        PauseRequest::Resume
    }

    /// Document hidden or window blurred.
    pub fn background(&mut self) -> Option<PauseRequest> {
        match self.intent {
            PauseIntent::Running => {
                self.intent = PauseIntent::AutoPaused;
                Some(PauseRequest::Pause)
            }
            PauseIntent::UserPaused | PauseIntent::AutoPaused => None,
        }
    }

    /// Document visible or window focused.
    pub fn foreground(&mut self) -> Option<PauseRequest> {
        match self.intent {
            PauseIntent::AutoPaused => {
                self.intent = PauseIntent::Running;
                Some(PauseRequest::Resume)
            }
            PauseIntent::UserPaused | PauseIntent::Running => None,
        }
    }

    /// `paused` / `resumed` frame from the server.
    pub fn apply_server_state(&mut self, paused: bool) {
        self.server_paused = paused;
    }

    /// Channel lifecycle ended. The server flag outlives the lifecycle so the
    /// UI does not flicker to "running" while a new channel negotiates.
    pub fn reset_intent(&mut self) {
        self.intent = PauseIntent::Running;
    }
}
