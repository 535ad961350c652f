//! Test doubles shared by the usecase tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use url::Url;

use crate::{
    domain::Generation,
    infrastructure::transport::{ChannelHandle, Connector, TransportEvent, TransportEventSender},
};

struct Opened {
    url: Url,
    generation: Generation,
    outbound: mpsc::UnboundedReceiver<String>,
    events: TransportEventSender,
    /// Whether each earlier channel was already closed when this one opened
    earlier_closed: Vec<bool>,
}

/// Connector that records every open instead of touching the network.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    opened: Arc<Mutex<Vec<Opened>>>,
}

impl RecordingConnector {
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn url(&self, index: usize) -> Url {
        self.opened.lock().unwrap()[index].url.clone()
    }

    pub fn generation(&self, index: usize) -> Generation {
        self.opened.lock().unwrap()[index].generation
    }

    /// Drain everything written to channel `index` so far.
    pub fn sent(&self, index: usize) -> Vec<String> {
        let mut opened = self.opened.lock().unwrap();
        let mut sent = Vec::new();
        while let Ok(text) = opened[index].outbound.try_recv() {
            sent.push(text);
        }
        sent
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.opened.lock().unwrap()[index].outbound.is_closed()
    }

    /// Deliver `event` as if channel `index` produced it.
    pub fn emit(&self, index: usize, event: TransportEvent) {
        let opened = self.opened.lock().unwrap();
        let channel = &opened[index];
        channel.events.send((channel.generation, event)).unwrap();
    }

    pub fn was_closed_before_open(&self, earlier: usize, later: usize) -> bool {
        self.opened.lock().unwrap()[later].earlier_closed[earlier]
    }
}

impl Connector for RecordingConnector {
    fn open(
        &self,
        url: Url,
        generation: Generation,
        events: TransportEventSender,
    ) -> ChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut opened = self.opened.lock().unwrap();
        let earlier_closed = opened.iter().map(|o| o.outbound.is_closed()).collect();
        opened.push(Opened {
            url,
            generation,
            outbound: rx,
            events,
            earlier_closed,
        });
        ChannelHandle::new(generation, tx, None)
    }
}
