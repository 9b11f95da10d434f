//! Transport Layer
//!
//! The admin API is spoken over plain UDP datagrams. The transport owns the
//! socket and forwards everything it receives to the session event loop
//! through a packet channel; sending is a direct call from the loop.

pub mod udp;

use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

// ============================================================================
// Packet Channel Types
// ============================================================================

/// A datagram received from the socket.
#[derive(Clone, Debug)]
pub struct ReceivedPacket {
    /// Address the datagram came from.
    pub remote_addr: SocketAddr,
    /// Datagram payload.
    pub data: Vec<u8>,
}

impl ReceivedPacket {
    /// Create a new received packet.
    pub fn new(remote_addr: SocketAddr, data: Vec<u8>) -> Self {
        Self { remote_addr, data }
    }
}

/// Channel sender for received packets.
pub type PacketTx = tokio::sync::mpsc::Sender<ReceivedPacket>;

/// Channel receiver for received packets.
pub type PacketRx = tokio::sync::mpsc::Receiver<ReceivedPacket>;

/// Create a packet channel with the given buffer size.
pub fn packet_channel(buffer: usize) -> (PacketTx, PacketRx) {
    tokio::sync::mpsc::channel(buffer)
}

// ============================================================================
// Errors
// ============================================================================

/// Errors related to transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport not started")]
    NotStarted,

    #[error("transport already started")]
    AlreadyStarted,

    #[error("transport failed to start: {0}")]
    StartFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("datagram too large: {size} > {max}")]
    DatagramTooLarge { size: usize, max: usize },
}

// ============================================================================
// Transport State
// ============================================================================

/// Transport lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    /// Configured but not started.
    Configured,
    /// Socket bind in progress.
    Starting,
    /// Socket bound, receive loop running.
    Up,
    /// Was up, now stopped.
    Down,
}

impl TransportState {
    /// Check if the transport is operational.
    pub fn is_operational(&self) -> bool {
        matches!(self, TransportState::Up)
    }

    /// Check if the transport can be started.
    pub fn can_start(&self) -> bool {
        matches!(self, TransportState::Configured | TransportState::Down)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportState::Configured => "configured",
            TransportState::Starting => "starting",
            TransportState::Up => "up",
            TransportState::Down => "down",
        };
        write!(f, "{}", s)
    }
}
