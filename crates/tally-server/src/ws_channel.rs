//! One WebSocket connection: identity, registration, read and write loops.
//!
//! Identity is resolved before the hub lock is taken and before the
//! channel is registered, so the connection cannot vote until it has an
//! identity. Outbound events go through an unbounded queue drained by a
//! dedicated writer task; the hub never waits on a socket.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use tally_network::identity::normalize_address;
use tally_network::interfaces;
use tally_protocol::{ChannelId, ClientIntent, ServerEvent, MALFORMED_FRAME_MESSAGE};
use tally_state::{Channel, Origin};

use crate::web_server::AppState;

#[derive(Debug)]
pub enum Outgoing {
    Event(Arc<ServerEvent>),
    Close,
}

/// Hub-side handle of a WebSocket connection.
pub struct WsChannel {
    id: ChannelId,
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl WsChannel {
    pub fn new(tx: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self {
            id: ChannelId::new(),
            tx,
        }
    }
}

impl Channel for WsChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn send(&self, event: Arc<ServerEvent>) {
        // A closed receiver means the writer already exited.
        let _ = self.tx.send(Outgoing::Event(event));
    }

    fn close(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}

pub async fn run_connection(socket: WebSocket, peer: SocketAddr, app: AppState) {
    let raw = peer.ip().to_string();
    let address = normalize_address(&raw).to_string();

    let identity = app.resolver.resolve(&address).await;
    let addresses = interfaces::list_display_addresses(app.port).await;

    let (tx, rx) = mpsc::unbounded_channel();
    let channel = WsChannel::new(tx);
    let origin = Origin::new(identity.device_id.clone(), channel.id(), address.clone());

    tracing::info!(
        address = %address,
        identity = %identity,
        channel = %origin.channel_id,
        "Connection"
    );

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, rx));

    app.hub
        .lock()
        .await
        .connect(&identity.device_id, channel, Some(addresses));

    tokio::select! {
        _ = read_loop(stream, &origin, &app) => {}
        _ = &mut writer => {}
    }

    app.hub
        .lock()
        .await
        .disconnect(&origin.device_id, origin.channel_id);
    writer.abort();
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    while let Some(outgoing) = rx.recv().await {
        match outgoing {
            Outgoing::Event(event) => {
                let frame = match event.to_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode outbound event");
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            Outgoing::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

async fn read_loop(mut stream: SplitStream<WebSocket>, origin: &Origin, app: &AppState) {
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(channel = %origin.channel_id, error = %e, "WebSocket read failed");
                break;
            }
        };

        match ClientIntent::from_frame(&text) {
            Ok(intent) => {
                tracing::debug!(
                    device_id = %origin.device_id,
                    event = intent.event_name(),
                    "Intent received"
                );
                app.hub.lock().await.apply(origin, intent);
            }
            Err(e) => {
                tracing::warn!(device_id = %origin.device_id, error = %e, "Malformed frame");
                app.hub
                    .lock()
                    .await
                    .notify(origin, ServerEvent::error(MALFORMED_FRAME_MESSAGE));
            }
        }
    }
}
