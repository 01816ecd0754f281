//! Background read loop and inbound frame dispatch.
//!
//! One task per connection blocks on the next inbound frame, decodes it
//! and routes it: heartbeats are answered on the spot, acknowledgments go
//! to the [`CallRegistry`], push events go to the [`PushCache`]. A read
//! error ends the loop for good.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::SplitStream;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;

use super::connection::ConnectionState;
use super::writer::{FrameWriter, WsStream};
use crate::domain::{CallRegistry, PushCache};
use crate::protocol::{self, HEARTBEAT_FRAME, Packet};

/// Routes one inbound text frame.
///
/// Returns the frame to write back, if any. Malformed frames are dropped
/// here and never reach a caller.
pub async fn dispatch(
    frame: &str,
    registry: &CallRegistry,
    cache: &PushCache,
) -> Option<&'static str> {
    match protocol::decode(frame) {
        Ok(Packet::Ping | Packet::Heartbeat) => Some(HEARTBEAT_FRAME),
        Ok(Packet::Open | Packet::Connect) => {
            tracing::debug!("server acknowledged connection");
            None
        }
        Ok(Packet::Event { name, args }) => {
            tracing::debug!(event = %name, args = args.len(), "push event received");
            let _ = cache.apply(&name, args).await;
            None
        }
        Ok(Packet::Ack { id, data }) => {
            let _ = registry.deliver(id, data).await;
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed frame");
            None
        }
    }
}

/// Runs until the socket fails or closes, then marks the connection
/// disconnected.
///
/// Pending calls are left alone; they fail through their own timeout.
pub async fn run_read_loop(
    mut stream: SplitStream<WsStream>,
    writer: Arc<FrameWriter>,
    state: Arc<RwLock<ConnectionState>>,
    registry: Arc<CallRegistry>,
    cache: Arc<PushCache>,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let Some(reply) = dispatch(text.as_str(), &registry, &cache).await else {
                    continue;
                };
                if let Err(e) = writer.send(reply).await {
                    tracing::warn!(error = %e, "failed to answer heartbeat");
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(?frame, "server closed the socket");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket read failed");
                break;
            }
        }
    }

    let mut state = state.write().await;
    if *state == ConnectionState::Connected {
        *state = ConnectionState::Disconnected;
        tracing::warn!("connection lost; no reconnect will be attempted");
    }
}
