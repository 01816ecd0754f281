//! Single-writer access to the socket.
//!
//! The WebSocket permits one writer at a time. Every outbound frame
//! (connect marker, heartbeat replies, calls, events) goes through
//! [`FrameWriter::send`], which holds the writer lock for exactly one
//! frame. Readers never touch this lock.

use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

/// Concrete client WebSocket stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the socket behind the writer lock.
#[derive(Debug)]
pub struct FrameWriter {
    sink: Mutex<SplitSink<WsStream, Message>>,
}

impl FrameWriter {
    /// Wraps the write half of a split socket.
    #[must_use]
    pub fn new(sink: SplitSink<WsStream, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Writes one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the socket rejects the write.
    pub async fn send(&self, frame: &str) -> Result<(), ClientError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(frame.to_owned()))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        tracing::trace!(frame, "frame written");
        Ok(())
    }

    /// Sends a close frame and flushes the sink.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if closing fails, typically
    /// because the peer is already gone.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
