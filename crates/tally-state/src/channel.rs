use std::sync::Arc;

use tally_protocol::{ChannelId, ServerEvent};

/// Outbound half of one live client connection.
///
/// Both methods must return immediately; delivery is fire-and-forget and a
/// channel whose peer is gone silently drops events.
pub trait Channel: Send {
    fn id(&self) -> ChannelId;

    fn send(&self, event: Arc<ServerEvent>);

    /// Terminate the connection after already-queued events are flushed.
    fn close(&self);
}
