use super::value_object::SpeedMultiplier;

/// Holds the pace last announced by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedController {
    current: SpeedMultiplier,
}

impl SpeedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SpeedMultiplier {
        self.current
    }

    /// Adopt a `speed_changed` value as-is; the server owns the valid range.
    pub fn apply_server_speed(&mut self, speed: SpeedMultiplier) {
        self.current = speed;
    }
}
