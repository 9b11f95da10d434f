//! Routing Table Accumulator
//!
//! `NodeStore_dumpTable` returns the daemon's routing table a page at a
//! time. Entries are keyed by their `ip` field and upserted as pages
//! arrive; the table is presented once the last page is in.

use crate::protocol::{key_text, Dict};
use serde_bencode::value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Field naming the route's destination address.
const IP_FIELD: &[u8] = b"ip";

/// One route: every field the daemon sent except `ip`.
pub type RouteEntry = BTreeMap<String, Value>;

/// Routes gathered across dump pages, keyed by address.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    routes: BTreeMap<String, RouteEntry>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one page of routes. Returns the number of entries accepted.
    ///
    /// Entries without a textual `ip` are skipped.
    pub fn upsert_page(&mut self, routes: Vec<Dict>) -> usize {
        let mut accepted = 0;
        for mut route in routes {
            let ip = match route.remove(IP_FIELD) {
                Some(Value::Bytes(ip)) => key_text(&ip),
                _ => {
                    debug!("Routing table entry without ip, skipping");
                    continue;
                }
            };
            let entry = route
                .into_iter()
                .map(|(k, v)| (key_text(&k), v))
                .collect();
            self.routes.insert(ip, entry);
            accepted += 1;
        }
        accepted
    }

    /// Look up a route by address.
    pub fn get(&self, ip: &str) -> Option<&RouteEntry> {
        self.routes.get(ip)
    }

    /// Iterate over routes in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RouteEntry)> {
        self.routes.iter()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
