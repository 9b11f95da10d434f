//! Admin Session
//!
//! The session owns everything a conversation with the daemon's admin
//! endpoint needs: liveness state, the idle countdown, the function
//! catalog, the table of calls awaiting a reply, pending route lookups,
//! the routing table accumulator and the scheduled timers.
//!
//! The session performs no I/O. Outbound datagrams are queued in an
//! outbox and timers are deadlines; [`Session::run`] drains the outbox
//! through the UDP transport and fires due timers.

mod handlers;
mod lifecycle;
mod timers;
#[cfg(test)]
mod tests;

use crate::catalog::{CatalogError, FunctionCatalog};
use crate::config::{CallConfig, Config, ConfigError};
use crate::identity::MeshAddress;
use crate::protocol::{self, Args};
use crate::report::ReportSink;
use crate::routes::RoutingTable;
use crate::utils::Txid;
use serde_bencode::value::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub use timers::{TimerKind, TimerSet};

/// Errors related to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("session stopped")]
    Stopped,

    #[error("session not ready for calls (state: {0})")]
    NotReady(SessionState),

    #[error("transaction id already in use: {0}")]
    DuplicateTxid(Txid),

    #[error("unknown remote function: {0}")]
    UnknownFunction(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<CatalogError> for SessionError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UnknownFunction(name) => SessionError::UnknownFunction(name),
        }
    }
}

/// Session operational state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing sent yet.
    Init,
    /// Pinging, no pong seen.
    Probing,
    /// Pong received.
    Alive,
    /// Catalog pages being fetched.
    Discovering,
    /// Catalog complete; calls accepted.
    Ready,
    /// Shut down.
    Stopped,
}

impl SessionState {
    /// Check if calls can be engaged.
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    /// Check if the session has stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, SessionState::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Init => "init",
            SessionState::Probing => "probing",
            SessionState::Alive => "alive",
            SessionState::Discovering => "discovering",
            SessionState::Ready => "ready",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// A call awaiting its cookie or its result.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingCall {
    /// Correlation id.
    pub txid: Txid,
    /// Remote function name.
    pub function: String,
    /// Resolved arguments, signed once the cookie arrives.
    pub args: Args,
    /// Pagination cursor the call was made with.
    pub cursor: Option<i64>,
}

/// Admin protocol session state.
pub struct Session<S: ReportSink> {
    // === Endpoint ===
    remote_addr: SocketAddr,
    secret: String,

    // === Liveness ===
    state: SessionState,
    ponged: bool,
    countdown: u32,
    timeout_ticks: u32,
    tick_interval: Duration,
    ping_check: Duration,
    timers: TimerSet,

    // === Calls ===
    catalog: FunctionCatalog,
    pending: HashMap<Txid, PendingCall>,
    /// Route lookups in flight: txid → peer address.
    address_lookups: HashMap<Txid, MeshAddress>,
    routing_table: RoutingTable,
    /// Calls engaged once discovery completes.
    startup_calls: VecDeque<CallConfig>,
    log_level: Option<String>,

    // === Presentation ===
    /// Display aliases keyed by IPv6 address text.
    names: HashMap<String, String>,
    sink: S,

    /// Datagrams waiting to be sent.
    outbox: VecDeque<Vec<u8>>,
}

impl<S: ReportSink> Session<S> {
    /// Create a session from configuration.
    ///
    /// Fails when the admin host is not an IP literal or no password is
    /// configured.
    pub fn new(config: &Config, sink: S) -> Result<Self, SessionError> {
        let remote_addr = config.admin_endpoint()?;
        let secret = config.password()?.to_string();
        let admin = &config.admin;

        Ok(Self {
            remote_addr,
            secret,
            state: SessionState::Init,
            ponged: false,
            countdown: admin.timeout_ticks(),
            timeout_ticks: admin.timeout_ticks(),
            tick_interval: admin.tick_interval(),
            ping_check: admin.ping_check(),
            timers: TimerSet::new(),
            catalog: FunctionCatalog::new(),
            pending: HashMap::new(),
            address_lookups: HashMap::new(),
            routing_table: RoutingTable::new(),
            startup_calls: admin.calls.iter().cloned().collect(),
            log_level: admin.log_level.clone(),
            names: admin.names.clone(),
            sink,
            outbox: VecDeque::new(),
        })
    }

    // === Accessors ===

    /// Admin endpoint address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if a pong has been received.
    pub fn ponged(&self) -> bool {
        self.ponged
    }

    /// Ticks left before the idle shutdown.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Scheduled timers.
    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    /// Function catalog.
    pub fn catalog(&self) -> &FunctionCatalog {
        &self.catalog
    }

    /// Look up a call awaiting a reply.
    pub fn pending_call(&self, txid: &Txid) -> Option<&PendingCall> {
        self.pending.get(txid)
    }

    /// Number of calls awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of route lookups in flight.
    pub fn address_lookup_count(&self) -> usize {
        self.address_lookups.len()
    }

    /// Accumulated routing table.
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Report sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable report sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Queue a call to engage once discovery completes.
    ///
    /// If the session is already ready the call is engaged immediately.
    pub fn queue_call(&mut self, call: CallConfig) -> Result<(), SessionError> {
        if self.state.is_ready() {
            self.engage(&call.function, None, None, &call.overrides())?;
        } else {
            self.startup_calls.push_back(call);
        }
        Ok(())
    }

    /// Take every datagram waiting to be sent.
    pub fn drain_outbox(&mut self) -> Vec<Vec<u8>> {
        self.outbox.drain(..).collect()
    }

    // === Internal helpers ===

    /// Encode a message and queue it for sending.
    pub(crate) fn send(&mut self, message: &Value) {
        match protocol::encode(message) {
            Ok(bytes) => self.outbox.push_back(bytes),
            Err(e) => warn!(error = %e, "Failed to encode admin message"),
        }
    }

    /// Display name for an address: its alias, or the address itself.
    pub(crate) fn nice_name(&self, ip: &str) -> String {
        self.names
            .get(ip)
            .cloned()
            .unwrap_or_else(|| ip.to_string())
    }
}

impl<S: ReportSink> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("remote_addr", &self.remote_addr)
            .field("state", &self.state)
            .field("countdown", &self.countdown)
            .field("functions", &self.catalog.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
