//! Presence and streaming state of one conversation.
//!
//! Tracks which thinkers are composing a reply and, optionally, a live
//! preview of what each one is thinking. The server is the only source of
//! truth: there are no timers, and a typing indicator stays until the server
//! says it stopped.

use std::collections::{BTreeMap, BTreeSet};

use super::value_object::ParticipantName;

/// Typing set plus preview mapping.
///
/// Invariant: every key of `thinking` is also a member of `typing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceTracker {
    typing: BTreeSet<ParticipantName>,
    thinking: BTreeMap<ParticipantName, String>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as composing a reply.
    pub fn start_typing(&mut self, name: ParticipantName) {
        self.typing.insert(name);
    }

    /// Store the latest preview for `name`.
    ///
    /// A preview implies the thinker is composing, so `name` joins the
    /// typing set if it was not already there.
    pub fn update_thinking(&mut self, name: ParticipantName, preview: String) {
        self.typing.insert(name.clone());
        self.thinking.insert(name, preview);
    }

    /// Remove `name` from both the typing set and the preview mapping.
    pub fn stop_typing(&mut self, name: &ParticipantName) {
        self.typing.remove(name);
        self.thinking.remove(name);
    }

    /// Forget everything. Called when a channel lifecycle ends.
    pub fn reset(&mut self) {
        self.typing.clear();
        self.thinking.clear();
    }

    pub fn is_typing(&self, name: &ParticipantName) -> bool {
        self.typing.contains(name)
    }

    pub fn typing(&self) -> &BTreeSet<ParticipantName> {
        &self.typing
    }

    pub fn thinking(&self) -> &BTreeMap<ParticipantName, String> {
        &self.thinking
    }

    pub fn is_empty(&self) -> bool {
        self.typing.is_empty()
    }
}
