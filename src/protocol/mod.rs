//! Wire protocol: frame codec and the server's event names.
//!
//! Pure functions only; nothing in this module touches the socket.

pub mod events;
pub mod frame;

pub use frame::{
    CONNECT_FRAME, FrameError, HEARTBEAT_FRAME, Packet, decode, encode_call, encode_emit,
};
