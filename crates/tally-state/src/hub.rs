//! Session hub: the single mutual-exclusion boundary of the server.
//!
//! The hub owns the [`Session`] and the [`ConnectionRegistry`]. None of its
//! methods suspend, so one lock around the hub makes every transition
//! atomic with respect to every other. Each successful transition ends
//! with [`SessionHub::broadcast`], which pushes the full state to every
//! registered channel; there are no deltas.

use std::sync::Arc;

use tally_protocol::{
    Category, ChannelId, ClientIntent, DisplayAddress, ServerEvent, StatusUpdate, VoteSubmission,
};

use crate::channel::Channel;
use crate::error::IntakeError;
use crate::export;
use crate::intake::Origin;
use crate::registry::ConnectionRegistry;
use crate::session::Session;

pub struct SessionHub<C> {
    session: Session,
    registry: ConnectionRegistry<C>,
}

impl<C: Channel> SessionHub<C> {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &ConnectionRegistry<C> {
        &self.registry
    }

    /// Register a channel whose identity has already been resolved and push
    /// the current state to it.
    ///
    /// `display_addresses`, when given, refreshes the advertised list first.
    /// Returns the id of a channel evicted for the same device.
    pub fn connect(
        &mut self,
        device_id: &str,
        channel: C,
        display_addresses: Option<Vec<DisplayAddress>>,
    ) -> Option<ChannelId> {
        if let Some(addresses) = display_addresses {
            self.session.set_display_addresses(addresses);
        }

        let channel_id = channel.id();
        let evicted = self.registry.register(device_id, channel);

        if let Some(channel) = self.registry.get(device_id) {
            channel.send(Arc::new(ServerEvent::StateSnapshot(self.session.snapshot())));
        }

        tracing::debug!(
            device_id,
            channel = %channel_id,
            connections = self.registry.len(),
            "Channel registered"
        );
        evicted
    }

    /// Forget a closed channel. A superseded channel never removes its
    /// successor.
    pub fn disconnect(&mut self, device_id: &str, channel_id: ChannelId) -> bool {
        let removed = self.registry.unregister(device_id, channel_id);
        tracing::debug!(device_id, channel = %channel_id, removed, "Channel closed");
        removed
    }

    /// Dispatch one inbound intent from `origin`.
    ///
    /// Intents from a channel that is not (or no longer) the live channel
    /// of its device are dropped.
    pub fn apply(&mut self, origin: &Origin, intent: ClientIntent) {
        if !self.registry.is_current(&origin.device_id, origin.channel_id) {
            tracing::warn!(
                device_id = %origin.device_id,
                channel = %origin.channel_id,
                event = intent.event_name(),
                "Dropping intent from unregistered channel"
            );
            return;
        }

        match intent {
            ClientIntent::CreateSession(params) => self.create_session(params.name, params.categories),
            ClientIntent::SelectDisplayAddress { index } => self.select_display_address(index),
            ClientIntent::UpdateStatus(update) => self.update_status(update),
            ClientIntent::SubmitVote(submission) => {
                let _ = self.submit_vote(origin, submission);
            }
        }
    }

    pub fn create_session(&mut self, name: String, categories: Vec<Category>) {
        self.session.create_session(name, categories);
        self.broadcast();
    }

    pub fn update_status(&mut self, update: StatusUpdate) {
        self.session.update_status(update);
        self.broadcast();
    }

    /// Out-of-range indices are ignored without a broadcast.
    pub fn select_display_address(&mut self, index: i64) {
        if self.session.select_display_address(index) {
            self.broadcast();
        } else {
            tracing::debug!(index, "Ignoring out-of-range display address selection");
        }
    }

    /// Run a ballot through intake. A rejection is reported to the
    /// submitting channel only and changes nothing.
    pub fn submit_vote(
        &mut self,
        origin: &Origin,
        submission: VoteSubmission,
    ) -> Result<usize, IntakeError> {
        match self.session.submit_vote(origin, submission) {
            Ok(accepted) => {
                self.broadcast();
                Ok(accepted)
            }
            Err(e) => {
                tracing::warn!(device_id = %origin.device_id, reason = %e, "Ballot rejected");
                self.notify(origin, ServerEvent::error(e.notice()));
                Err(e)
            }
        }
    }

    /// Send an event to the live channel of `origin`, if it still is live.
    pub fn notify(&self, origin: &Origin, event: ServerEvent) {
        if let Some(channel) = self.registry.get(&origin.device_id) {
            if channel.id() == origin.channel_id {
                channel.send(Arc::new(event));
            }
        }
    }

    /// CSV export of the current vote log.
    pub fn export_csv(&self) -> String {
        export::export_csv(self.session.categories(), self.session.votes())
    }

    /// Push the full state to every registered channel.
    pub fn broadcast(&self) {
        let event = Arc::new(ServerEvent::StateSnapshot(self.session.snapshot()));
        for channel in self.registry.channels() {
            channel.send(Arc::clone(&event));
        }
    }
}
