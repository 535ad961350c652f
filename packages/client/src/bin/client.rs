//! Terminal client that follows one Symposium conversation.
//!
//! Prints thinker messages and presence as they arrive; typed lines are
//! sent as user messages, and `/`-commands drive pause, speed, and the
//! visibility simulation.
//!
//! Run with:
//! ```not_rust
//! SYMPOSIUM_TOKEN=... cargo run --bin symposium-client -- --conversation <id>
//! ```

use std::{thread, time::Duration};

use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use symposium_client::{
    BearerToken, ChannelObserver, ConversationId, StaticCredential, SyncClient, SyncConfig,
    WebSocketConnector,
    config::{DEFAULT_RECONNECT_DELAY, DEFAULT_SERVER_URL},
    ui::cli::{CliCommand, CliError, HELP, render_event, render_status},
};
use symposium_shared::logger::setup_logger;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "symposium-client", version, about = "Symposium terminal client")]
struct Args {
    /// Backend base URL (ws, wss, http or https)
    #[arg(short, long, env = "SYMPOSIUM_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Bearer token used to open the channel
    #[arg(short, long, env = "SYMPOSIUM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Conversation to join on startup
    #[arg(short, long)]
    conversation: Option<String>,

    /// Seconds to wait before reconnecting after a disconnect
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY.as_secs())]
    reconnect_delay_secs: u64,

    /// Log level for this binary when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = SyncConfig::new(&args.server)?
        .with_reconnect_delay(Duration::from_secs(args.reconnect_delay_secs));
    let token = match args.token.map(BearerToken::new).transpose() {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Ignoring token: {}", e);
            None
        }
    };
    let conversation = args
        .conversation
        .map(ConversationId::new)
        .transpose()
        .map_err(CliError::InvalidConversation)?;

    let mut lines = spawn_line_reader()?;
    let (observer, mut notifications) = ChannelObserver::channel();
    let (client, session) = SyncClient::spawn(
        config,
        WebSocketConnector::new(),
        StaticCredential::new(token),
        observer,
    );
    if conversation.is_some() {
        client.select_conversation(conversation);
    }
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                match CliCommand::parse(&line) {
                    Ok(CliCommand::Quit) => break,
                    Ok(command) => execute(&client, command),
                    Err(e) => println!("! {e}"),
                }
            }
            Some(event) = notifications.recv() => {
                println!("{}", render_event(&event));
            }
        }
    }

    client.shutdown();
    if let Err(e) = session.await {
        tracing::error!("Sync session ended abnormally: {}", e);
    }
    Ok(())
}

fn execute(client: &SyncClient, command: CliCommand) {
    match command {
        CliCommand::Empty | CliCommand::Quit => {}
        CliCommand::Message(text) => {
            client.start_typing();
            client.send_message(text);
            client.stop_typing();
        }
        CliCommand::Pause => client.pause(),
        CliCommand::Resume => client.resume(),
        CliCommand::Speed(value) => client.set_speed(value),
        CliCommand::Visibility(visible) => client.set_visibility(visible),
        CliCommand::Focus(focused) => client.set_focus(focused),
        CliCommand::Switch(conversation_id) => client.select_conversation(conversation_id),
        CliCommand::Status => println!("{}", render_status(&client.snapshot())),
        CliCommand::Help => println!("{HELP}"),
    }
}

/// Read lines on a dedicated thread; the receiver closes on EOF or Ctrl-C.
fn spawn_line_reader() -> Result<mpsc::UnboundedReceiver<String>, CliError> {
    let mut editor = DefaultEditor::new().map_err(|e| CliError::Readline(e.to_string()))?;
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("Line editor error: {}", e);
                    break;
                }
            }
        }
    });

    Ok(rx)
}
