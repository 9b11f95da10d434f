//! Peer, route and result handlers.

use crate::identity::{public_key_to_address, MeshAddress};
use crate::protocol::{
    bytes, Args, Dict, FN_BEGIN_CONNECTION, FN_DUMP_TABLE, FN_LOG_SUBSCRIBE, FN_NODE_FOR_ADDR,
    FN_PING_NODE, FN_ROUTE_LOOKUP, FN_SWITCH_PING,
};
use crate::report::{Report, ReportSink};
use crate::session::{Session, SessionError};
use crate::utils::Txid;
use serde_bencode::value::Value;
use tracing::{debug, info, warn};

const PUBLIC_KEY_FIELD: &[u8] = b"publicKey";

impl<S: ReportSink> Session<S> {
    /// Report each peer and look up its route.
    pub(in crate::session) fn on_peers(&mut self, peers: Vec<Dict>) {
        debug!(count = peers.len(), "Peer list received");

        for mut info in peers {
            let key = match info.remove(PUBLIC_KEY_FIELD) {
                Some(Value::Bytes(key)) => String::from_utf8_lossy(&key).into_owned(),
                _ => {
                    warn!("Peer entry without publicKey, skipping");
                    continue;
                }
            };
            let address = match public_key_to_address(&key) {
                Ok(address) => address,
                Err(e) => {
                    warn!(key = %key, error = %e, "Invalid peer public key, skipping");
                    continue;
                }
            };

            let name = self.nice_name(&address.to_string());
            self.sink.report(Report::Peer {
                name,
                address,
                info,
            });

            if let Err(e) = self.route_lookup(address) {
                warn!(address = %address, error = %e, "Route lookup not sent");
            }
        }
    }

    /// Ask the daemon for its route to `address`.
    pub fn route_lookup(&mut self, address: MeshAddress) -> Result<Txid, SessionError> {
        let txid = Txid::generate();
        let mut overrides = Args::new();
        overrides.insert("address".to_string(), bytes(&address.to_string()));

        self.address_lookups.insert(txid.clone(), address);
        match self.engage(FN_ROUTE_LOOKUP, Some(txid.clone()), None, &overrides) {
            Ok(txid) => Ok(txid),
            Err(e) => {
                self.address_lookups.remove(&txid);
                Err(e)
            }
        }
    }

    /// Upsert a routing table page; fetch the next or present the table.
    pub(in crate::session) fn on_routing_table_page(
        &mut self,
        routes: Vec<Dict>,
        more: bool,
        cursor: Option<i64>,
    ) {
        let accepted = self.routing_table.upsert_page(routes);
        debug!(accepted, more, cursor = ?cursor, "Routing table page received");

        if more {
            let next = cursor.unwrap_or(0) + 1;
            if let Err(e) = self.engage(FN_DUMP_TABLE, None, Some(next), &Args::new()) {
                warn!(page = next, error = %e, "Cannot request next routing table page");
            }
            return;
        }

        info!(routes = self.routing_table.len(), "Routing table complete");
        let entries = self
            .routing_table
            .iter()
            .map(|(ip, route)| (self.nice_name(ip), route.clone()))
            .collect();
        self.sink.report(Report::RoutingTable { entries });
    }

    /// Present a correlated reply according to the function it answers.
    pub(in crate::session) fn on_response(
        &mut self,
        txid: Option<Txid>,
        result: Option<Value>,
        message: Dict,
    ) {
        if let Some(address) = txid.as_ref().and_then(|t| self.address_lookups.remove(t)) {
            let function = self
                .resolve_pending(txid.as_ref())
                .map(|call| call.function);
            if result.is_some() {
                self.sink.report(Report::CallCompleted { function });
            }
            let name = self.nice_name(&address.to_string());
            self.sink.report(Report::Route { name, result });
            return;
        }

        let function = self
            .resolve_pending(txid.as_ref())
            .map(|call| call.function);
        let has_result = result.is_some();

        if has_result {
            self.sink.report(Report::CallCompleted {
                function: function.clone(),
            });
        }

        match function.as_deref() {
            Some(FN_NODE_FOR_ADDR) if has_result => {
                self.sink.report(Report::NodeInfo { message });
            }
            Some(f @ (FN_SWITCH_PING | FN_PING_NODE)) => {
                self.sink.report(Report::PingResult {
                    function: f.to_string(),
                    message,
                });
            }
            Some(FN_BEGIN_CONNECTION) => {
                self.sink.report(Report::Connection { message });
            }
            Some(FN_LOG_SUBSCRIBE) => {
                self.sink.report(Report::LogEntry { message });
            }
            _ if !has_result => {
                debug!(txid = ?txid, function = ?function, "Reply without result");
            }
            _ => {}
        }
    }
}
