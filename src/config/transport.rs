//! Transport configuration types.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default IPv4 bind address (ephemeral port).
const DEFAULT_UDP_BIND_ADDR_V4: &str = "0.0.0.0:0";

/// Default IPv6 bind address (ephemeral port).
const DEFAULT_UDP_BIND_ADDR_V6: &str = "[::]:0";

/// Largest admin reply observed from the daemon.
pub const DEFAULT_MAX_DATAGRAM: usize = 69632;

/// UDP socket configuration (`transports.udp.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UdpConfig {
    /// Local bind address (`bind_addr`). Defaults to an ephemeral port on
    /// the unspecified address of the admin endpoint's family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_addr: Option<String>,

    /// Receive buffer and send limit in bytes (`max_datagram`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_datagram: Option<usize>,
}

impl UdpConfig {
    /// Get the bind address for talking to `remote`.
    pub fn bind_addr_for(&self, remote: &SocketAddr) -> &str {
        match &self.bind_addr {
            Some(addr) => addr,
            None if remote.is_ipv6() => DEFAULT_UDP_BIND_ADDR_V6,
            None => DEFAULT_UDP_BIND_ADDR_V4,
        }
    }

    /// Get the datagram size limit, using default if not configured.
    pub fn max_datagram(&self) -> usize {
        self.max_datagram.unwrap_or(DEFAULT_MAX_DATAGRAM)
    }

    /// Merge another UDP config into this one.
    pub fn merge(&mut self, other: UdpConfig) {
        if other.bind_addr.is_some() {
            self.bind_addr = other.bind_addr;
        }
        if other.max_datagram.is_some() {
            self.max_datagram = other.max_datagram;
        }
    }
}

/// Transport section (`transports.*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportsConfig {
    /// UDP socket settings (`transports.udp`).
    #[serde(default)]
    pub udp: UdpConfig,
}

impl TransportsConfig {
    /// Merge another transports section into this one.
    pub fn merge(&mut self, other: TransportsConfig) {
        self.udp.merge(other.udp);
    }
}
