//! Line-oriented terminal front end: command parsing and rendering.

use thiserror::Error;

use crate::{
    config::ConfigError,
    domain::{ConversationId, ValueObjectError},
    usecase::{observer::SyncEvent, session::SessionSnapshot},
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid conversation id: {0}")]
    InvalidConversation(#[source] ValueObjectError),

    #[error("unknown command '/{0}' (try /help)")]
    UnknownCommand(String),

    #[error("/{0} requires an argument")]
    MissingArgument(&'static str),

    #[error("invalid speed '{0}': expected a number such as 1.5")]
    InvalidSpeed(String),

    #[error("line editor error: {0}")]
    Readline(String),
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Blank line
    Empty,
    /// Plain text, sent as a user message
    Message(String),
    Pause,
    Resume,
    Speed(f64),
    /// `/hide` and `/show`
    Visibility(bool),
    /// `/blur` and `/focus`
    Focus(bool),
    /// `/switch <id>` binds, `/leave` unbinds
    Switch(Option<ConversationId>),
    Status,
    Help,
    Quit,
}

impl CliCommand {
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Message(line.to_string()));
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match name {
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "speed" => {
                let arg = arg.ok_or(CliError::MissingArgument("speed"))?;
                let value = arg
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CliError::InvalidSpeed(arg.to_string()))?;
                Ok(Self::Speed(value))
            }
            "hide" => Ok(Self::Visibility(false)),
            "show" => Ok(Self::Visibility(true)),
            "blur" => Ok(Self::Focus(false)),
            "focus" => Ok(Self::Focus(true)),
            "switch" => {
                let arg = arg.ok_or(CliError::MissingArgument("switch"))?;
                let id = ConversationId::new(arg.to_string())
                    .map_err(CliError::InvalidConversation)?;
                Ok(Self::Switch(Some(id)))
            }
            "leave" => Ok(Self::Switch(None)),
            "status" => Ok(Self::Status),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CliError::UnknownCommand(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /pause            pause the conversation
  /resume           resume the conversation
  /speed <x>        set the thinker speed multiplier
  /hide, /show      simulate the tab becoming hidden or visible
  /blur, /focus     simulate the window losing or gaining focus
  /switch <id>      switch to another conversation
  /leave            leave the current conversation
  /status           show connection and presence state
  /quit             exit
Anything else is sent as a message.";

/// Human-readable line for one notification.
pub fn render_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Message(message) => {
            let name = message.sender_name.as_deref().unwrap_or("thinker");
            let time = message.timestamp.format("%H:%M:%S");
            match message.cost {
                Some(cost) => format!("[{time}] {name}: {} (${cost:.4})", message.content),
                None => format!("[{time}] {name}: {}", message.content),
            }
        }
        SyncEvent::TypingStarted(name) => format!("* {name} is typing..."),
        SyncEvent::Thinking { name, preview } => format!("* {name} is thinking: {preview}"),
        SyncEvent::TypingStopped(name) => format!("* {name} stopped typing"),
        SyncEvent::Error(error) => format!("! {error}"),
    }
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let conversation = snapshot
        .conversation_id
        .as_ref()
        .map_or("(none)", ConversationId::as_str);
    let mut lines = vec![format!(
        "conversation: {conversation}, connected: {}, paused: {}, speed: {}",
        snapshot.connected, snapshot.paused, snapshot.speed
    )];
    if !snapshot.typing.is_empty() {
        let names: Vec<&str> = snapshot.typing.iter().map(|n| n.as_str()).collect();
        lines.push(format!("typing: {}", names.join(", ")));
    }
    for (name, preview) in &snapshot.thinking {
        lines.push(format!("thinking ({name}): {preview}"));
    }
    lines.join("\n")
}
