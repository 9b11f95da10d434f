//! Inbound datagram dispatch.

use crate::protocol::{self, Reply, ReplyKind};
use crate::report::ReportSink;
use crate::session::{Session, SessionError};
use tracing::{debug, trace, warn};

impl<S: ReportSink> Session<S> {
    /// Handle one datagram from the admin endpoint.
    ///
    /// Any datagram, even one that fails to decode, counts as activity
    /// and restores the idle countdown. Malformed and unexpected replies
    /// are logged and dropped; only failures of calls the session engages
    /// on the caller's behalf are returned.
    pub fn on_datagram(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if self.state.is_stopped() {
            trace!(len = data.len(), "Datagram after stop, ignoring");
            return Ok(());
        }
        self.reset_countdown();

        let message = match protocol::decode(data) {
            Ok(message) => message,
            Err(e) => {
                debug!(len = data.len(), error = %e, "Malformed admin datagram, dropping");
                return Ok(());
            }
        };

        let reply = match Reply::classify(message) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Admin reply with unexpected field types, dropping");
                return Ok(());
            }
        };

        trace!(kind = reply.kind.name(), txid = ?reply.txid, "Admin reply");
        self.dispatch(reply)
    }

    fn dispatch(&mut self, reply: Reply) -> Result<(), SessionError> {
        let Reply {
            txid,
            kind,
            message,
        } = reply;

        match kind {
            ReplyKind::Pong => {
                self.on_pong();
                Ok(())
            }
            ReplyKind::FunctionPage { functions, more } => {
                self.on_function_page(functions, more)
            }
            ReplyKind::Cookie { cookie } => {
                self.handle_cookie(txid, &cookie);
                Ok(())
            }
            ReplyKind::Peers { peers } => {
                self.resolve_pending(txid.as_ref());
                self.on_peers(peers);
                Ok(())
            }
            ReplyKind::RoutingTablePage { routes, more } => {
                let cursor = self
                    .resolve_pending(txid.as_ref())
                    .and_then(|call| call.cursor);
                self.on_routing_table_page(routes, more, cursor);
                Ok(())
            }
            ReplyKind::Response { result } => {
                self.on_response(txid, result, message);
                Ok(())
            }
            ReplyKind::Unrecognized => {
                debug!(
                    keys = message.len(),
                    "Unrecognized admin message, dropping"
                );
                Ok(())
            }
        }
    }
}
