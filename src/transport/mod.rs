//! Transport layer: socket ownership, single-writer discipline, read loop.
//!
//! The connection speaks the Socket.IO framing from [`crate::protocol`]
//! over one WebSocket and feeds the [`crate::domain`] registry and caches.

pub mod connection;
pub mod reader;
pub mod writer;

pub use connection::{Connection, ConnectionState, interpret_result};
pub use writer::FrameWriter;
