//! In-process mock of the Symposium backend's conversation channel.
//!
//! Speaks the same frames as the real backend: it answers `pause`,
//! `resume`, and `set_speed` with the confirming broadcast, echoes user
//! messages, and closes with code 4001 when the token does not match.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Frame received from a client, with the conversation it arrived on
#[derive(Debug, Clone)]
pub struct Received {
    pub conversation_id: String,
    pub frame: Value,
}

struct BackendState {
    token: String,
    /// Server-side senders of every accepted connection, in accept order
    connections: Mutex<Vec<(String, mpsc::UnboundedSender<Message>)>>,
    attempts: Mutex<Vec<String>>,
    /// Conversation ids of accepted connections that have since ended
    closed: Mutex<Vec<String>>,
    received: mpsc::UnboundedSender<Received>,
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    received: tokio::sync::Mutex<mpsc::UnboundedReceiver<Received>>,
}

impl MockBackend {
    /// Start a backend on an ephemeral port that accepts `token`.
    pub async fn start(token: &str) -> Self {
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let state = Arc::new(BackendState {
            token: token.to_string(),
            connections: Mutex::new(Vec::new()),
            attempts: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            received: received_tx,
        });

        let app = Router::new()
            .route("/ws/{conversation_id}", get(websocket_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend crashed");
        });

        Self {
            addr,
            state,
            received: tokio::sync::Mutex::new(received_rx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Conversation ids of every upgrade request, accepted or not.
    pub fn attempts(&self) -> Vec<String> {
        self.state.attempts.lock().unwrap().clone()
    }

    /// Wait until `count` connections to `conversation_id` have been accepted.
    pub async fn wait_for_connections(&self, conversation_id: &str, count: usize) {
        let accepted = || {
            self.state
                .connections
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| id == conversation_id)
                .count()
        };
        tokio::time::timeout(RECEIVE_TIMEOUT, async {
            while accepted() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for a client connection");
    }

    /// Wait until an accepted connection to `conversation_id` has ended.
    pub async fn wait_for_close(&self, conversation_id: &str) {
        let ended = || {
            self.state
                .closed
                .lock()
                .unwrap()
                .iter()
                .any(|id| id == conversation_id)
        };
        tokio::time::timeout(RECEIVE_TIMEOUT, async {
            while !ended() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for the connection to close");
    }

    /// Send `frame` to every open connection of `conversation_id`.
    pub fn push(&self, conversation_id: &str, frame: Value) {
        let text = frame.to_string();
        for (id, sender) in self.state.connections.lock().unwrap().iter() {
            if id == conversation_id {
                let _ = sender.send(Message::Text(text.clone().into()));
            }
        }
    }

    /// Close every open connection from the server side.
    pub fn drop_connections(&self) {
        for (_, sender) in self.state.connections.lock().unwrap().drain(..) {
            let _ = sender.send(Message::Close(None));
        }
    }

    /// Next frame a client sent, or panic after a timeout.
    pub async fn next_received(&self) -> Received {
        let mut received = self.received.lock().await;
        tokio::time::timeout(RECEIVE_TIMEOUT, received.recv())
            .await
            .expect("Timed out waiting for a client frame")
            .expect("Mock backend stopped")
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(state): State<Arc<BackendState>>,
) -> impl IntoResponse {
    state
        .attempts
        .lock()
        .unwrap()
        .push(conversation_id.clone());
    let authorized = query.token.as_deref() == Some(state.token.as_str());
    ws.on_upgrade(move |socket| async move {
        if authorized {
            handle_socket(socket, state, conversation_id).await;
        } else {
            reject(socket).await;
        }
    })
}

async fn reject(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: 4001,
            reason: "Invalid token".into(),
        })))
        .await;
}

async fn handle_socket(socket: WebSocket, state: Arc<BackendState>, conversation_id: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state
        .connections
        .lock()
        .unwrap()
        .push((conversation_id.clone(), tx.clone()));

    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let Some(Ok(Message::Text(text))) = incoming else { break };
                let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else { continue };
                if let Some(reply) = reply_to(&conversation_id, &frame) {
                    let _ = tx.send(Message::Text(reply.to_string().into()));
                }
                let _ = state.received.send(Received {
                    conversation_id: conversation_id.clone(),
                    frame,
                });
            }
            _ = &mut writer => break,
        }
    }
    writer.abort();
    state.closed.lock().unwrap().push(conversation_id);
}

/// The broadcast the backend answers a client frame with, if any.
fn reply_to(conversation_id: &str, frame: &Value) -> Option<Value> {
    match frame["type"].as_str()? {
        "pause" => Some(json!({"type": "paused", "conversation_id": conversation_id})),
        "resume" => Some(json!({"type": "resumed", "conversation_id": conversation_id})),
        "set_speed" => {
            let requested = frame["speed_multiplier"].as_f64().unwrap_or(1.0);
            Some(json!({
                "type": "speed_changed",
                "conversation_id": conversation_id,
                "speed_multiplier": requested.clamp(0.5, 6.0),
            }))
        }
        "user_message" => Some(json!({
            "type": "message",
            "conversation_id": conversation_id,
            "sender_type": "user",
            "content": frame["content"],
            "message_id": uuid::Uuid::new_v4().to_string(),
        })),
        _ => None,
    }
}
