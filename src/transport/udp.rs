//! UDP Transport Implementation
//!
//! One locally bound socket talking to the single admin endpoint.

use super::{PacketTx, ReceivedPacket, TransportError, TransportState};
use crate::config::UdpConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// UDP transport for the admin API.
///
/// Connectionless and unreliable: nothing here orders or retransmits,
/// correlation is left entirely to transaction ids at the session layer.
pub struct UdpTransport {
    /// Configuration.
    config: UdpConfig,
    /// Admin endpoint every datagram is sent to.
    remote_addr: SocketAddr,
    /// Current state.
    state: TransportState,
    /// Bound socket (None until started).
    socket: Option<Arc<UdpSocket>>,
    /// Channel for delivering received packets to the session.
    packet_tx: PacketTx,
    /// Receive loop task handle.
    recv_task: Option<JoinHandle<()>>,
    /// Local bound address (after start).
    local_addr: Option<SocketAddr>,
}

impl UdpTransport {
    /// Create a new UDP transport for the given admin endpoint.
    pub fn new(remote_addr: SocketAddr, config: UdpConfig, packet_tx: PacketTx) -> Self {
        Self {
            config,
            remote_addr,
            state: TransportState::Configured,
            socket: None,
            packet_tx,
            recv_task: None,
            local_addr: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Get the admin endpoint address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Get the local bound address (only valid after start).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the socket and spawn the receive loop.
    pub async fn start_async(&mut self) -> Result<(), TransportError> {
        if !self.state.can_start() {
            return Err(TransportError::AlreadyStarted);
        }

        self.state = TransportState::Starting;

        let bind_addr: SocketAddr = match self.config.bind_addr_for(&self.remote_addr).parse() {
            Ok(addr) => addr,
            Err(e) => {
                self.state = TransportState::Configured;
                return Err(TransportError::StartFailed(format!(
                    "invalid bind address: {}",
                    e
                )));
            }
        };

        let socket = match UdpSocket::bind(bind_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                self.state = TransportState::Configured;
                return Err(TransportError::StartFailed(format!("bind failed: {}", e)));
            }
        };

        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::StartFailed(format!("get local addr: {}", e)))?;
        self.local_addr = Some(local_addr);

        let socket = Arc::new(socket);
        self.socket = Some(socket.clone());

        let packet_tx = self.packet_tx.clone();
        let max_datagram = self.config.max_datagram();

        let recv_task = tokio::spawn(async move {
            udp_receive_loop(socket, packet_tx, max_datagram).await;
        });

        self.recv_task = Some(recv_task);
        self.state = TransportState::Up;

        info!(
            local_addr = %local_addr,
            remote_addr = %self.remote_addr,
            "UDP transport started"
        );

        Ok(())
    }

    /// Stop the receive loop and release the socket.
    pub async fn stop_async(&mut self) -> Result<(), TransportError> {
        if !self.state.is_operational() {
            return Err(TransportError::NotStarted);
        }

        if let Some(task) = self.recv_task.take() {
            task.abort();
            let _ = task.await; // Ignore JoinError from abort
        }

        self.socket.take();
        self.local_addr = None;
        self.state = TransportState::Down;

        debug!(remote_addr = %self.remote_addr, "UDP transport stopped");

        Ok(())
    }

    /// Send one datagram to the admin endpoint.
    pub async fn send_async(&self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.state.is_operational() {
            return Err(TransportError::NotStarted);
        }

        let max = self.config.max_datagram();
        if data.len() > max {
            return Err(TransportError::DatagramTooLarge {
                size: data.len(),
                max,
            });
        }

        let socket = self.socket.as_ref().ok_or(TransportError::NotStarted)?;

        let bytes_sent = socket
            .send_to(data, self.remote_addr)
            .await
            .map_err(|e| TransportError::SendFailed(format!("{}", e)))?;

        trace!(
            remote_addr = %self.remote_addr,
            bytes = bytes_sent,
            "UDP datagram sent"
        );

        Ok(bytes_sent)
    }
}

/// UDP receive loop - runs as a spawned task.
async fn udp_receive_loop(socket: Arc<UdpSocket>, packet_tx: PacketTx, max_datagram: usize) {
    let mut buf = vec![0u8; max_datagram];

    debug!("UDP receive loop starting");

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, remote_addr)) => {
                let packet = ReceivedPacket::new(remote_addr, buf[..len].to_vec());

                trace!(
                    remote_addr = %remote_addr,
                    bytes = len,
                    "UDP datagram received"
                );

                if packet_tx.send(packet).await.is_err() {
                    info!("Packet channel closed, stopping receive loop");
                    break;
                }
            }
            Err(e) => {
                // Transient errors (e.g. ICMP port unreachable) are expected
                // while the daemon is down; keep listening.
                warn!(error = %e, "UDP receive error");
            }
        }
    }

    debug!("UDP receive loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::packet_channel;
    use tokio::time::{timeout, Duration};

    fn make_config() -> UdpConfig {
        UdpConfig {
            bind_addr: Some("127.0.0.1:0".to_string()),
            max_datagram: None,
        }
    }

    async fn make_peer() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_start_stop() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let mut transport = UdpTransport::new(peer_addr, make_config(), tx);

        assert_eq!(transport.state(), TransportState::Configured);

        transport.start_async().await.unwrap();
        assert_eq!(transport.state(), TransportState::Up);
        assert!(transport.local_addr().is_some());

        transport.stop_async().await.unwrap();
        assert_eq!(transport.state(), TransportState::Down);
        assert!(transport.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_double_start_fails() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let mut transport = UdpTransport::new(peer_addr, make_config(), tx);

        transport.start_async().await.unwrap();

        let result = transport.start_async().await;
        assert!(matches!(result, Err(TransportError::AlreadyStarted)));

        transport.stop_async().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_not_started_fails() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let mut transport = UdpTransport::new(peer_addr, make_config(), tx);

        let result = transport.stop_async().await;
        assert!(matches!(result, Err(TransportError::NotStarted)));
    }

    #[tokio::test]
    async fn test_send_recv() {
        let (tx, mut rx) = packet_channel(100);
        let (peer, peer_addr) = make_peer().await;
        let mut transport = UdpTransport::new(peer_addr, make_config(), tx);
        transport.start_async().await.unwrap();
        let local = transport.local_addr().unwrap();

        // Transport -> endpoint
        let sent = transport.send_async(b"d1:q4:pinge").await.unwrap();
        assert_eq!(sent, 11);

        let mut buf = [0u8; 64];
        let (len, from) = timeout(Duration::from_secs(1), peer.recv_from(&mut buf))
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(&buf[..len], b"d1:q4:pinge");
        assert_eq!(from, local);

        // Endpoint -> transport
        peer.send_to(b"d1:q4:ponge", local).await.unwrap();
        let packet = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(packet.data, b"d1:q4:ponge");
        assert_eq!(packet.remote_addr, peer_addr);

        transport.stop_async().await.unwrap();
    }

    #[tokio::test]
    async fn test_datagram_too_large() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let config = UdpConfig {
            max_datagram: Some(100),
            ..make_config()
        };
        let mut transport = UdpTransport::new(peer_addr, config, tx);
        transport.start_async().await.unwrap();

        let oversized = vec![0u8; 200];
        let result = transport.send_async(&oversized).await;
        assert!(matches!(
            result,
            Err(TransportError::DatagramTooLarge { size: 200, max: 100 })
        ));

        transport.stop_async().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_not_started() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let transport = UdpTransport::new(peer_addr, make_config(), tx);

        let result = transport.send_async(b"test").await;
        assert!(matches!(result, Err(TransportError::NotStarted)));
    }

    #[tokio::test]
    async fn test_invalid_bind_addr() {
        let (tx, _rx) = packet_channel(100);
        let (_peer, peer_addr) = make_peer().await;
        let config = UdpConfig {
            bind_addr: Some("not_an_address".to_string()),
            max_datagram: None,
        };
        let mut transport = UdpTransport::new(peer_addr, config, tx);

        let result = transport.start_async().await;
        assert!(matches!(result, Err(TransportError::StartFailed(_))));
        assert_eq!(transport.state(), TransportState::Configured);
    }
}
