//! Session event loop.

use crate::report::ReportSink;
use crate::session::{Session, SessionError};
use crate::transport::udp::UdpTransport;
use crate::transport::{PacketRx, ReceivedPacket};
use std::time::Instant;
use tracing::{debug, info, warn};

impl<S: ReportSink> Session<S> {
    /// Run the session until it stops.
    ///
    /// Starts the session, then serves two event sources: datagrams from
    /// the transport's receive loop and the session's own timer deadlines.
    /// Each event runs to completion before queued datagrams are flushed.
    /// When the session stops, the transport is stopped too.
    ///
    /// Returns an error if a queued startup call cannot be engaged.
    pub async fn run(
        &mut self,
        transport: &mut UdpTransport,
        packet_rx: &mut PacketRx,
    ) -> Result<(), SessionError> {
        self.start(Instant::now())?;
        self.flush(transport).await;

        info!("Session event loop started");

        let result = loop {
            if self.state.is_stopped() {
                break Ok(());
            }
            let deadline = self.timers.next_deadline();

            tokio::select! {
                packet = packet_rx.recv() => {
                    match packet {
                        Some(p) => {
                            let handled = self.process_packet(p);
                            self.flush(transport).await;
                            if let Err(e) = handled {
                                self.stop("Call failed");
                                break Err(e);
                            }
                        }
                        None => self.stop("Transport closed"),
                    }
                }
                _ = sleep_until(deadline) => {
                    self.fire_due_timers(Instant::now());
                    self.flush(transport).await;
                }
            }
        };

        if let Err(e) = transport.stop_async().await {
            debug!(error = %e, "Transport already down");
        }
        info!(state = %self.state, "Session event loop stopped");
        result
    }

    fn process_packet(&mut self, packet: ReceivedPacket) -> Result<(), SessionError> {
        if packet.remote_addr != self.remote_addr {
            debug!(
                from = %packet.remote_addr,
                expected = %self.remote_addr,
                "Datagram from unexpected address"
            );
        }
        self.on_datagram(&packet.data)
    }

    /// Send every queued datagram.
    async fn flush(&mut self, transport: &UdpTransport) {
        while let Some(data) = self.outbox.pop_front() {
            if let Err(e) = transport.send_async(&data).await {
                warn!(len = data.len(), error = %e, "Failed to send admin datagram");
            }
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}
