//! One live channel per device.
//!
//! Registering a device that already has a different channel tells the old
//! channel it was superseded and closes it before the mapping is replaced.
//! Unregistering is guarded by channel id, so a late disconnect of an
//! evicted channel cannot remove its successor.

use std::collections::HashMap;
use std::sync::Arc;

use tally_protocol::{ChannelId, ServerEvent, SUPERSEDED_MESSAGE};

use crate::channel::Channel;

pub struct ConnectionRegistry<C> {
    entries: HashMap<String, C>,
}

impl<C: Channel> ConnectionRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Map `device_id` to `channel`, evicting any previous channel.
    ///
    /// Returns the id of the evicted channel, if one was evicted.
    pub fn register(&mut self, device_id: &str, channel: C) -> Option<ChannelId> {
        let new_id = channel.id();
        let previous = self.entries.insert(device_id.to_string(), channel)?;

        if previous.id() == new_id {
            return None;
        }

        previous.send(Arc::new(ServerEvent::superseded(SUPERSEDED_MESSAGE)));
        previous.close();
        tracing::info!(
            device_id,
            evicted = %previous.id(),
            replacement = %new_id,
            "Superseded previous connection for device"
        );
        Some(previous.id())
    }

    /// Remove the mapping only if it still points at `channel_id`.
    pub fn unregister(&mut self, device_id: &str, channel_id: ChannelId) -> bool {
        match self.entries.get(device_id) {
            Some(current) if current.id() == channel_id => {
                self.entries.remove(device_id);
                true
            }
            _ => false,
        }
    }

    /// Whether `channel_id` is the live channel of `device_id`.
    pub fn is_current(&self, device_id: &str, channel_id: ChannelId) -> bool {
        self.entries
            .get(device_id)
            .is_some_and(|c| c.id() == channel_id)
    }

    pub fn get(&self, device_id: &str) -> Option<&C> {
        self.entries.get(device_id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &C> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Channel> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
