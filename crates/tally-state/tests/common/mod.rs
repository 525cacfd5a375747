#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tally_protocol::{ChannelId, Scores, ServerEvent, SessionSnapshot};
use tally_state::Channel;

/// Channel double that records everything sent to it.
#[derive(Clone)]
pub struct RecordingChannel {
    id: ChannelId,
    log: Arc<Mutex<Log>>,
}

#[derive(Default)]
struct Log {
    events: Vec<Arc<ServerEvent>>,
    closed: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId::new(),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    pub fn events(&self) -> Vec<Arc<ServerEvent>> {
        self.log.lock().unwrap().events.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.log.lock().unwrap().closed
    }

    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        self.events()
            .iter()
            .filter_map(|e| match e.as_ref() {
                ServerEvent::StateSnapshot(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| match e.as_ref() {
                ServerEvent::ErrorNotice { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn superseded_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e.as_ref(), ServerEvent::SupersededNotice { .. }))
            .count()
    }
}

impl Channel for RecordingChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn send(&self, event: Arc<ServerEvent>) {
        self.log.lock().unwrap().events.push(event);
    }

    fn close(&self) {
        self.log.lock().unwrap().closed = true;
    }
}

/// Build a score map from `(category id, value)` pairs.
pub fn scores(pairs: &[(&str, serde_json::Value)]) -> Scores {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
