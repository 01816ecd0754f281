//! # kuma-socket
//!
//! Socket.IO protocol client for driving an Uptime Kuma instance.
//!
//! The crate speaks the Engine.IO v4 / Socket.IO text framing over a single
//! WebSocket, correlates calls with their acknowledgments, answers
//! heartbeats, and keeps two local caches (monitor snapshot, notification
//! list) rebuilt from the server's unsolicited push events. Callers use the
//! typed [`KumaClient`] facade.
//!
//! ## Architecture
//!
//! ```text
//! Callers
//!     │
//!     ├── KumaClient (service/)
//!     ├── convergence: refresh / poll (service/)
//!     │
//!     ├── Connection: writer lock, call, emit (transport/)
//!     ├── read loop ──► CallRegistry / PushCache (domain/)
//!     │
//!     └── frame codec (protocol/)
//! ```
//!
//! A connection is opened once; when it is lost the client stays
//! disconnected and every operation fails with
//! [`ClientError::NotConnected`].

pub mod config;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;

pub use config::ClientConfig;
pub use domain::{Monitor, Notification};
pub use error::{ClientError, ErrorKind};
pub use service::KumaClient;
pub use transport::ConnectionState;
