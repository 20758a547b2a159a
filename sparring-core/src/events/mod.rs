//! ## sparring-core::events
//! **What a client saw, in order**
//!
//! Each connection records a `TimedEvent` for every observable step of its
//! lifecycle. Offsets are measured from the case anchor, so events of
//! different clients in the same case can be compared directly.

mod report;

pub use report::{CaseResult, ClientReport};

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

/// A single observable step in a client's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    ConnectAttempt,
    Connected { local: Option<SocketAddr> },
    ConnectFailed { error: String },
    Received { bytes: Bytes },
    Sent { bytes: Bytes },
    /// A write was requested but not performed (no message, not connected).
    WriteSkipped { reason: String },
    WriteFailed { error: String },
    /// A disconnect arrived while a write was still blocked on the peer.
    WriteAbandoned,
    ReadFailed { error: String },
    /// The peer closed its side cleanly.
    PeerClosed,
    KeepaliveTick,
    DisconnectRequested,
    Disconnected,
}

impl ClientEvent {
    /// Whether this event represents a failure worth surfacing in a case result.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ClientEvent::ConnectFailed { .. }
                | ClientEvent::WriteFailed { .. }
                | ClientEvent::ReadFailed { .. }
        )
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::ConnectAttempt => f.write_str("connect attempt"),
            ClientEvent::Connected { local: Some(addr) } => write!(f, "connected from {addr}"),
            ClientEvent::Connected { local: None } => f.write_str("connected"),
            ClientEvent::ConnectFailed { error } => write!(f, "connect failed: {error}"),
            ClientEvent::Received { bytes } => write!(f, "received {} bytes", bytes.len()),
            ClientEvent::Sent { bytes } => write!(f, "sent {} bytes", bytes.len()),
            ClientEvent::WriteSkipped { reason } => write!(f, "write skipped: {reason}"),
            ClientEvent::WriteFailed { error } => write!(f, "write failed: {error}"),
            ClientEvent::WriteAbandoned => f.write_str("write abandoned"),
            ClientEvent::ReadFailed { error } => write!(f, "read failed: {error}"),
            ClientEvent::PeerClosed => f.write_str("peer closed"),
            ClientEvent::KeepaliveTick => f.write_str("keepalive"),
            ClientEvent::DisconnectRequested => f.write_str("disconnect requested"),
            ClientEvent::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// A client event stamped with its offset from the case anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub at: Duration,
    pub event: ClientEvent,
}

impl TimedEvent {
    #[inline]
    pub fn new(at: Duration, event: ClientEvent) -> Self {
        Self { at, event }
    }
}

/// Renders a payload for a log line: UTF-8 text as is, anything else as hex.
pub fn render_payload(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}
