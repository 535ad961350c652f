//! WebSocket connector built on tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::{ChannelHandle, Connector, TransportEvent, TransportEventSender};
use crate::domain::Generation;

/// Close code the backend uses when the token is missing or invalid
const CLOSE_CODE_UNAUTHORIZED: u16 = 4001;

/// Opens real WebSocket channels on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn open(
        &self,
        url: Url,
        generation: Generation,
        events: TransportEventSender,
    ) -> ChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let task = tokio::spawn(run_channel(url, generation, events, rx));
        ChannelHandle::new(generation, tx, Some(task.abort_handle()))
    }
}

async fn run_channel(
    url: Url,
    generation: Generation,
    events: TransportEventSender,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let emit = |event: TransportEvent| {
        // The session may already be gone; nothing left to notify then.
        let _ = events.send((generation, event));
    };

    tracing::debug!("Channel {} connecting to {}", generation, redact(&url));

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!("Channel {} failed to connect: {}", generation, e);
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Closed {
                code: None,
                reason: e.to_string(),
            });
            return;
        }
    };

    tracing::info!("Channel {} open", generation);
    emit(TransportEvent::Opened);

    let (mut sink, mut stream) = stream.split();

    // Writer: drains the outbound queue until the handle drops its sender,
    // then closes the socket.
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                tracing::warn!("Channel {} write failed: {}", generation, e);
                return;
            }
        }
        let _ = sink.close().await;
    });

    let mut close_code = None;
    let mut close_reason = String::new();

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::trace!("Channel {} received: {}", generation, text.as_str());
                emit(TransportEvent::Frame(text.as_str().to_string()));
            }
            Ok(Message::Binary(bytes)) => {
                // Let the dispatcher decide whether it parses.
                emit(TransportEvent::Frame(
                    String::from_utf8_lossy(&bytes).into_owned(),
                ));
            }
            Ok(Message::Close(frame)) => {
                if let Some(frame) = frame {
                    close_code = Some(u16::from(frame.code));
                    close_reason = frame.reason.as_str().to_string();
                }
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Channel {} error: {}", generation, e);
                emit(TransportEvent::Error(e.to_string()));
                break;
            }
        }
    }

    writer.abort();

    match close_code {
        Some(CLOSE_CODE_UNAUTHORIZED) => tracing::warn!(
            "Channel {} rejected by server: {}",
            generation,
            close_reason
        ),
        Some(code) => tracing::info!(
            "Channel {} closed by server (code {}): {}",
            generation,
            code,
            close_reason
        ),
        None => tracing::info!("Channel {} closed", generation),
    }

    emit(TransportEvent::Closed {
        code: close_code,
        reason: close_reason,
    });
}

/// URL without the token, for logs.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
