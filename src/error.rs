//! Client error types with a stable kind mapping.
//!
//! [`ClientError`] is the central error type for the client. Each variant
//! maps to an [`ErrorKind`] so callers can branch on the failure class
//! (for example "entity deleted upstream") without matching on messages.

use std::fmt;

use crate::protocol::FrameError;

/// Entity families managed through the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A monitor record.
    Monitor,
    /// A notification provider record.
    Notification,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monitor => f.write_str("monitor"),
            Self::Notification => f.write_str("notification"),
        }
    }
}

/// Coarse failure class of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded or is invalid.
    Config,
    /// Dial or handshake failure. Fatal at construction.
    Connection,
    /// Login rejected by the server. Fatal at construction.
    Authentication,
    /// The connection is closed (explicitly or by the read loop).
    NotConnected,
    /// A frame could not be encoded or written.
    Transport,
    /// No acknowledgment arrived within the call timeout.
    CallTimeout,
    /// The server answered `ok: false`.
    Api,
    /// The entity is absent from the cache.
    NotFound,
    /// A fire-and-forget mutation was not observed in the cache in time.
    ConvergenceTimeout,
}

/// Client-side error enum.
///
/// # Error Classes
///
/// | Variant              | Fatal | Outcome on the server          |
/// |----------------------|-------|--------------------------------|
/// | `Connection`         | yes   | nothing happened               |
/// | `Authentication`     | yes   | nothing happened               |
/// | `CallTimeout`        | no    | unknown                        |
/// | `Api`                | no    | rejected                       |
/// | `NotFound`           | no    | entity absent (deleted)        |
/// | `ConvergenceTimeout` | no    | unknown, possibly applied      |
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration value missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// WebSocket dial or Socket.IO handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Login was answered with `ok: false`.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Server-provided reason.
        message: String,
    },

    /// The connection has been closed and is never re-established.
    #[error("not connected")]
    NotConnected,

    /// Writing a frame to the socket failed.
    #[error("failed to send message: {0}")]
    Transport(String),

    /// An outgoing frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] FrameError),

    /// No acknowledgment was received for a correlated call.
    #[error("timeout waiting for response to `{event}` after {timeout_ms} ms")]
    CallTimeout {
        /// Event name of the call.
        event: String,
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The server rejected a call.
    #[error("API error: {message}")]
    Api {
        /// Server-provided message, or a generic fallback.
        message: String,
    },

    /// The entity is not present in the local cache.
    #[error("{entity} with ID {id} not found")]
    NotFound {
        /// Entity family.
        entity: Entity,
        /// Requested identifier.
        id: i64,
    },

    /// A mutation was sent but never observed in the cache.
    #[error("{entity} was {action} but not found in cache after {attempts} attempts")]
    ConvergenceTimeout {
        /// Entity family.
        entity: Entity,
        /// Past-tense action, e.g. `"created"`.
        action: &'static str,
        /// Number of poll attempts spent.
        attempts: u32,
    },
}

impl ClientError {
    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::NotConnected => ErrorKind::NotConnected,
            Self::Transport(_) | Self::Protocol(_) => ErrorKind::Transport,
            Self::CallTimeout { .. } => ErrorKind::CallTimeout,
            Self::Api { .. } => ErrorKind::Api,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConvergenceTimeout { .. } => ErrorKind::ConvergenceTimeout,
        }
    }

    /// Returns `true` if the entity is gone from the server's point of view.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the request may or may not have been applied.
    #[must_use]
    pub const fn is_uncertain(&self) -> bool {
        matches!(
            self,
            Self::CallTimeout { .. } | Self::ConvergenceTimeout { .. }
        )
    }
}
