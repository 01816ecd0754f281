//! Two-level Engine.IO / Socket.IO text framing.
//!
//! The first character selects the transport packet type; when it is a
//! message (`4`) the second character selects the protocol packet type.
//!
//! ```text
//! 0{...}              open
//! 2 / 3               ping / heartbeat
//! 40{...}             namespace connect
//! 42["name", ...]     push event
//! 43<id>{...}         acknowledgment of call <id>
//! ```

use serde_json::Value;

/// Namespace connect marker sent right after the socket opens.
pub const CONNECT_FRAME: &str = "40";

/// Bare heartbeat written in reply to every inbound ping or heartbeat.
pub const HEARTBEAT_FRAME: &str = "3";

/// Reasons a frame could not be decoded or encoded.
///
/// Inbound decode failures are never surfaced to callers; the read loop
/// drops the frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Zero-length frame.
    #[error("empty frame")]
    Empty,

    /// Unknown transport packet type.
    #[error("unknown packet type `{0}`")]
    UnknownPacket(char),

    /// Message frame without a protocol packet type.
    #[error("truncated message frame")]
    Truncated,

    /// Unknown protocol packet type inside a message frame.
    #[error("unknown message type `{0}`")]
    UnknownMessage(char),

    /// Event array whose first element is not a string.
    #[error("event frame without a name")]
    MissingEventName,

    /// Acknowledgment with no JSON value after the id.
    #[error("ack frame without payload")]
    MissingAckPayload,

    /// Acknowledgment id is not a decimal number.
    #[error("invalid ack id `{0}`")]
    InvalidAckId(String),

    /// Payload is not valid JSON.
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Transport open (`0`). Acknowledged, never dispatched.
    Open,
    /// Transport ping (`2`). Answered with a heartbeat.
    Ping,
    /// Heartbeat (`3`). Answered with a heartbeat.
    Heartbeat,
    /// Namespace connect confirmation (`40`).
    Connect,
    /// Push event (`42`).
    Event {
        /// Event name, first element of the array.
        name: String,
        /// Remaining array elements in order.
        args: Vec<Value>,
    },
    /// Acknowledgment of a correlated call (`43<id>`).
    Ack {
        /// Correlation id echoed by the server.
        id: u64,
        /// The call's single result value.
        data: Value,
    },
}

impl Packet {
    /// Encodes the packet back into its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if a payload fails to serialize.
    pub fn encode(&self) -> Result<String, FrameError> {
        match self {
            Self::Open => Ok("0".to_string()),
            Self::Ping => Ok("2".to_string()),
            Self::Heartbeat => Ok(HEARTBEAT_FRAME.to_string()),
            Self::Connect => Ok(CONNECT_FRAME.to_string()),
            Self::Event { name, args } => {
                let mut array = Vec::with_capacity(args.len().saturating_add(1));
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                Ok(format!("42{}", serde_json::to_string(&array)?))
            }
            Self::Ack { id, data } => Ok(format!("43{id}{}", serde_json::to_string(data)?)),
        }
    }
}

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns a [`FrameError`] describing the first stage that failed.
pub fn decode(frame: &str) -> Result<Packet, FrameError> {
    let mut chars = frame.chars();
    match chars.next() {
        Some('0') => Ok(Packet::Open),
        Some('2') => Ok(Packet::Ping),
        Some('3') => Ok(Packet::Heartbeat),
        Some('4') => decode_message(chars.as_str()),
        Some(other) => Err(FrameError::UnknownPacket(other)),
        None => Err(FrameError::Empty),
    }
}

fn decode_message(body: &str) -> Result<Packet, FrameError> {
    let mut chars = body.chars();
    match chars.next() {
        Some('0') => Ok(Packet::Connect),
        Some('2') => decode_event(chars.as_str()),
        Some('3') => decode_ack(chars.as_str()),
        Some(other) => Err(FrameError::UnknownMessage(other)),
        None => Err(FrameError::Truncated),
    }
}

fn decode_event(payload: &str) -> Result<Packet, FrameError> {
    let values: Vec<Value> = serde_json::from_str(payload)?;
    let mut values = values.into_iter();
    let Some(Value::String(name)) = values.next() else {
        return Err(FrameError::MissingEventName);
    };
    Ok(Packet::Event {
        name,
        args: values.collect(),
    })
}

fn decode_ack(payload: &str) -> Result<Packet, FrameError> {
    // The id has no fixed width; it ends where the JSON value begins.
    let start = payload
        .find(|c: char| c == '[' || c == '{')
        .ok_or(FrameError::MissingAckPayload)?;
    let (digits, json) = payload.split_at(start);
    let id = digits
        .parse::<u64>()
        .map_err(|_| FrameError::InvalidAckId(digits.to_string()))?;
    let data = serde_json::from_str(json)?;
    Ok(Packet::Ack { id, data })
}

/// Encodes a fire-and-forget event: `42["event", data]`.
///
/// # Errors
///
/// Returns [`FrameError::Json`] if `data` fails to serialize.
pub fn encode_emit(event: &str, data: &Value) -> Result<String, FrameError> {
    Ok(format!("42{}", serde_json::to_string(&(event, data))?))
}

/// Encodes a correlated call: `42<id>["event", data]`.
///
/// # Errors
///
/// Returns [`FrameError::Json`] if `data` fails to serialize.
pub fn encode_call(id: u64, event: &str, data: &Value) -> Result<String, FrameError> {
    Ok(format!("42{id}{}", serde_json::to_string(&(event, data))?))
}
