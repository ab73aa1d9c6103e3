//! Text framing spoken by the browser client.
//!
//! The client expects the engine.io / socket.io text protocol:
//!
//! | Direction | Frame | Meaning |
//! |-----------|-------|---------|
//! | server → client | `0{"sid":..}` | open packet, sent once |
//! | server → client | `42["blocks",{..}]` | full chain snapshot |
//! | server → client | `42["tx",{..}]` | one mempool sighting |
//! | client → server | `2` | keep-alive ping, answered with `3` |
//!
//! Event frames are encoded once per event and shared by every connection.

use crate::domain::connection::ConnectionId;
use crate::domain::error::BroadcastError;
use serde::Serialize;
use shared_bus::ClockEvent;
use std::sync::Arc;
use std::time::Duration;

/// An encoded, immutable frame shared by all recipients.
pub type Frame = Arc<str>;

/// engine.io MESSAGE followed by socket.io EVENT.
pub const EVENT_PREFIX: &str = "42";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenPacket<'a> {
    sid: String,
    upgrades: &'a [&'a str],
    ping_interval: u64,
    ping_timeout: u64,
}

/// The handshake announcing the session id and keep-alive timings.
pub fn open_packet(
    sid: &ConnectionId,
    ping_interval: Duration,
    ping_timeout: Duration,
) -> Result<Frame, BroadcastError> {
    let packet = OpenPacket {
        sid: sid.to_string(),
        upgrades: &[],
        ping_interval: ping_interval.as_millis() as u64,
        ping_timeout: ping_timeout.as_millis() as u64,
    };
    let body = serde_json::to_string(&packet).map_err(|e| BroadcastError::Encode {
        event: "open",
        message: e.to_string(),
    })?;
    Ok(format!("0{body}").into())
}

/// `42["<name>",<payload>]`
pub fn event_frame<T: Serialize + ?Sized>(
    name: &'static str,
    payload: &T,
) -> Result<Frame, BroadcastError> {
    let body = serde_json::to_string(&(name, payload)).map_err(|e| BroadcastError::Encode {
        event: name,
        message: e.to_string(),
    })?;
    Ok(format!("{EVENT_PREFIX}{body}").into())
}

pub fn clock_event_frame(event: &ClockEvent) -> Result<Frame, BroadcastError> {
    match event {
        ClockEvent::Blocks(snapshot) => event_frame(event.name(), snapshot.as_ref()),
        ClockEvent::Tx(summary) => event_frame(event.name(), summary.as_ref()),
    }
}

/// A frame received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    /// engine.io ping, with optional payload (`2probe`).
    Ping(String),
    Pong,
    Close,
    /// engine.io MESSAGE; the client never sends any the server acts on.
    Message(String),
    Other,
}

impl ClientPacket {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut chars = text.chars();
        let payload = || text.get(1..).unwrap_or_default().to_string();
        match chars.next() {
            Some('2') => Self::Ping(payload()),
            Some('3') => Self::Pong,
            Some('1') => Self::Close,
            Some('4') => Self::Message(payload()),
            _ => Self::Other,
        }
    }

    /// Frame to send back, if any.
    #[must_use]
    pub fn reply(&self) -> Option<String> {
        match self {
            Self::Ping(payload) => Some(format!("3{payload}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shared_types::fixtures::{header, tx_summary};
    use shared_types::ChainSnapshot;

    fn payload(frame: &str) -> Value {
        assert!(frame.starts_with("42"));
        serde_json::from_str(&frame[2..]).unwrap()
    }

    #[test]
    fn test_blocks_frame_is_keyed_by_height() {
        let snapshot: ChainSnapshot = (100..=101).map(header).collect();
        let frame = clock_event_frame(&ClockEvent::blocks(Arc::new(snapshot))).unwrap();

        let value = payload(&frame);
        assert_eq!(value[0], "blocks");
        assert_eq!(value[1]["101"]["height"], 101);
        assert!(value[1]["100"]["recvtime"].is_number());
    }

    #[test]
    fn test_tx_frame() {
        let summary = tx_summary(3, 2);
        let frame = clock_event_frame(&ClockEvent::tx(summary.clone())).unwrap();

        let value = payload(&frame);
        assert_eq!(value[0], "tx");
        assert_eq!(value[1]["hash"], summary.hash.to_string());
        assert_eq!(value[1]["outputs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_open_packet() {
        let sid = ConnectionId::new();
        let frame =
            open_packet(&sid, Duration::from_secs(25), Duration::from_secs(60)).unwrap();

        assert!(frame.starts_with('0'));
        let value: Value = serde_json::from_str(&frame[1..]).unwrap();
        assert_eq!(value["sid"], sid.to_string());
        assert_eq!(value["pingInterval"], 25_000);
        assert_eq!(value["pingTimeout"], 60_000);
        assert_eq!(value["upgrades"], serde_json::json!([]));
    }

    #[test]
    fn test_client_packets() {
        assert_eq!(ClientPacket::parse("2"), ClientPacket::Ping(String::new()));
        assert_eq!(ClientPacket::parse("2").reply().as_deref(), Some("3"));
        assert_eq!(ClientPacket::parse("2probe").reply().as_deref(), Some("3probe"));
        assert_eq!(ClientPacket::parse("3"), ClientPacket::Pong);
        assert_eq!(ClientPacket::parse("1"), ClientPacket::Close);
        assert_eq!(
            ClientPacket::parse("42[\"hi\"]"),
            ClientPacket::Message("2[\"hi\"]".into())
        );
        assert_eq!(ClientPacket::parse(""), ClientPacket::Other);
        assert!(ClientPacket::parse("42[]").reply().is_none());
    }
}
