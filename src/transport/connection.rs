//! WebSocket connection lifecycle and the call/emit primitives.
//!
//! A [`Connection`] is opened once per client and never re-established:
//!
//! ```text
//! open() ──► Connected ──(read error / server close)──► Disconnected
//!               │                                          │
//!               └──────────────── close() ─────────────────┴──► Closed
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use url::Url;

use super::reader::run_read_loop;
use super::writer::FrameWriter;
use crate::config::ClientConfig;
use crate::domain::{CallRegistry, PushCache};
use crate::error::ClientError;
use crate::protocol::{self, CONNECT_FRAME};

/// Message used when a rejected call carries no `msg`.
const GENERIC_API_ERROR: &str = "unknown error";

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket open, read loop running.
    Connected,
    /// The read loop ended on a transport error or server close.
    Disconnected,
    /// [`Connection::close`] was called.
    Closed,
}

/// One Socket.IO session over a WebSocket.
#[derive(Debug)]
pub struct Connection {
    writer: Arc<FrameWriter>,
    state: Arc<RwLock<ConnectionState>>,
    registry: Arc<CallRegistry>,
    call_timeout: Duration,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Dials the endpoint, starts the read loop and sends the namespace
    /// connect marker.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an unusable base URL and
    /// [`ClientError::Connection`] if the dial or the connect marker fails.
    pub async fn open(
        config: &ClientConfig,
        registry: Arc<CallRegistry>,
        cache: Arc<PushCache>,
    ) -> Result<Self, ClientError> {
        let url = config.socket_url()?;
        install_crypto_provider();

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Connection(format!("websocket connection failed: {e}")))?;
        let (sink, stream) = socket.split();

        let writer = Arc::new(FrameWriter::new(sink));
        let state = Arc::new(RwLock::new(ConnectionState::Connected));
        let reader = tokio::spawn(run_read_loop(
            stream,
            Arc::clone(&writer),
            Arc::clone(&state),
            Arc::clone(&registry),
            cache,
        ));
        let connection = Self {
            writer,
            state,
            registry,
            call_timeout: config.call_timeout,
            reader,
        };

        if let Err(e) = connection.writer.send(CONNECT_FRAME).await {
            connection.close().await;
            return Err(ClientError::Connection(format!(
                "failed to send connect message: {e}"
            )));
        }
        tokio::time::sleep(config.handshake_settle).await;

        tracing::info!(url = %redacted(&url), "socket connected");
        Ok(connection)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Returns `true` while the socket is usable.
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    async fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.is_connected().await {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// Sends an event without waiting for any answer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] after the connection ended,
    /// or a transport/protocol error if the frame cannot be written.
    pub async fn emit(&self, event: &str, data: &Value) -> Result<(), ClientError> {
        self.ensure_connected().await?;
        let frame = protocol::encode_emit(event, data)?;
        self.writer.send(&frame).await?;
        tracing::debug!(event, "event emitted");
        Ok(())
    }

    /// Sends a correlated call and waits for its acknowledgment.
    ///
    /// The registry entry is removed on every exit path; an ack arriving
    /// after the timeout is dropped by the read loop.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] after the connection ended.
    /// - [`ClientError::CallTimeout`] if no ack arrives in time.
    /// - [`ClientError::Api`] if the result carries `ok: false`.
    /// - Transport/protocol errors if the frame cannot be written.
    pub async fn call(&self, event: &str, data: &Value) -> Result<Map<String, Value>, ClientError> {
        self.ensure_connected().await?;
        let (id, response) = self.registry.register(event).await;
        let outcome = self.exchange(id, event, data, response).await;
        // No-op when the read loop already delivered.
        let _ = self.registry.remove(id).await;
        outcome
    }

    async fn exchange(
        &self,
        id: u64,
        event: &str,
        data: &Value,
        response: oneshot::Receiver<Value>,
    ) -> Result<Map<String, Value>, ClientError> {
        let frame = protocol::encode_call(id, event, data)?;
        self.writer.send(&frame).await?;

        match tokio::time::timeout(self.call_timeout, response).await {
            Ok(Ok(value)) => interpret_result(value),
            Ok(Err(_)) => Err(ClientError::NotConnected),
            Err(_) => {
                tracing::warn!(id, event, "no acknowledgment before timeout");
                Err(ClientError::CallTimeout {
                    event: event.to_string(),
                    timeout_ms: u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Number of calls waiting for an acknowledgment.
    pub async fn pending_calls(&self) -> usize {
        self.registry.len().await
    }

    /// Closes the socket. Idempotent: only the first call writes the
    /// close frame.
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        if let Err(e) = self.writer.close().await {
            tracing::debug!(error = %e, "close frame not delivered");
        }
        self.reader.abort();
        tracing::info!("connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Applies the `{ok, msg}` envelope convention to a call result.
///
/// Socket.IO acknowledgments carry an argument array; its first element is
/// the result. A non-object result is treated as an empty success.
///
/// # Errors
///
/// Returns [`ClientError::Api`] when the result has `ok: false`.
pub fn interpret_result(value: Value) -> Result<Map<String, Value>, ClientError> {
    let result = match value {
        Value::Array(args) => args.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };
    let Value::Object(result) = result else {
        return Ok(Map::new());
    };
    if result.get("ok") == Some(&Value::Bool(false)) {
        let message = result
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_API_ERROR)
            .to_string();
        return Err(ClientError::Api { message });
    }
    Ok(result)
}

/// Installs the process-wide TLS provider used for `wss://` endpoints.
fn install_crypto_provider() {
    // Fails harmlessly when a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Endpoint for logging, without query string.
fn redacted(url: &Url) -> String {
    format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or_default(), url.path())
}
