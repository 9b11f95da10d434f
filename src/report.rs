//! Result Presentation
//!
//! The session never prints. Everything worth showing an operator is
//! handed to a [`ReportSink`] as a [`Report`]; the console sink prints
//! them and appends subscribed daemon log entries to a file.

use crate::identity::MeshAddress;
use crate::protocol::{key_text, Dict};
use crate::routes::RouteEntry;
use serde_bencode::value::Value;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Something the session wants presented.
#[derive(Clone, Debug, PartialEq)]
pub enum Report {
    /// Function discovery finished.
    DiscoveryComplete { pages: u32, functions: usize },
    /// One entry of a peer list.
    Peer {
        name: String,
        address: MeshAddress,
        info: Dict,
    },
    /// Route lookup answer for a peer.
    Route { name: String, result: Option<Value> },
    /// A call returned a `result`.
    CallCompleted { function: Option<String> },
    /// Full `NodeStore_nodeForAddr` reply.
    NodeInfo { message: Dict },
    /// Routing table after the last dump page.
    RoutingTable { entries: Vec<(String, RouteEntry)> },
    /// Full reply to a ping function.
    PingResult { function: String, message: Dict },
    /// Full reply to a connection request.
    Connection { message: Dict },
    /// One entry from the daemon log subscription.
    LogEntry { message: Dict },
    /// The session is shutting down.
    Stopping { reason: String },
}

/// Destination for reports.
pub trait ReportSink {
    /// Present one report.
    fn report(&mut self, report: Report);
}

/// Sink that keeps every report, for inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Vec<Report>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, oldest first.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Take and clear the received reports.
    pub fn drain(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }
}

impl ReportSink for MemorySink {
    fn report(&mut self, report: Report) {
        self.reports.push(report);
    }
}

/// Sink that prints to stdout and writes log entries to a file.
pub struct ConsoleSink {
    log_path: PathBuf,
    log_file: Option<File>,
}

impl ConsoleSink {
    /// Create a console sink writing log entries to `log_path`.
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            log_file: None,
        }
    }

    fn write_log_entry(&mut self, message: &Dict) {
        if self.log_file.is_none() {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
            {
                Ok(file) => self.log_file = Some(file),
                Err(e) => {
                    warn!(path = %self.log_path.display(), error = %e, "Cannot open admin log file");
                    return;
                }
            }
        }
        if let Some(file) = self.log_file.as_mut() {
            if let Err(e) = writeln!(file, "{}", DictDisplay(message)) {
                warn!(path = %self.log_path.display(), error = %e, "Admin log write failed");
            }
        }
    }
}

impl ReportSink for ConsoleSink {
    fn report(&mut self, report: Report) {
        match report {
            Report::DiscoveryComplete { pages, functions } => {
                println!("No more pages of functions. Received {} ({} functions)", pages, functions);
            }
            Report::Peer {
                name,
                address,
                info,
            } => {
                println!("==={}=== ({})", name, address);
                println!("{}", DictDisplay(&info));
            }
            Report::Route { name, result } => match result {
                Some(result) => println!("{} has a route: {}", name, ValueDisplay(&result)),
                None => println!("{} has a route: (no result)", name),
            },
            Report::CallCompleted { function } => {
                println!(
                    "======GOT RESULT for {}======",
                    function.as_deref().unwrap_or("(unknown)")
                );
            }
            Report::NodeInfo { message } => {
                println!("======NODE INFORMATION======");
                println!("{}", DictDisplay(&message));
                println!("======END NODE INFORMATION======");
            }
            Report::RoutingTable { entries } => {
                println!("======ROUTING TABLE======");
                for (name, route) in &entries {
                    let fields: Vec<String> = route
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, ValueDisplay(v)))
                        .collect();
                    println!("{} - {{{}}}", name, fields.join(", "));
                }
                println!("======END ROUTING TABLE======");
            }
            Report::PingResult { function, message } => {
                println!("======PING RESULT ({})======", function);
                println!("{}", DictDisplay(&message));
            }
            Report::Connection { message } => {
                println!("======Ethernet Connection======");
                println!("{}", DictDisplay(&message));
            }
            Report::LogEntry { message } => self.write_log_entry(&message),
            Report::Stopping { reason } => println!("{}. Stopping.", reason),
        }
    }
}

/// Human-readable rendering of a bencode value.
///
/// Byte strings print as text when they are valid UTF-8, as hex otherwise.
pub struct ValueDisplay<'a>(pub &'a Value);

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "'{}'", s),
                Err(_) => write!(f, "0x{}", hex::encode(b)),
            },
            Value::Int(n) => write!(f, "{}", n),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", ValueDisplay(item))?;
                }
                f.write_str("]")
            }
            Value::Dict(d) => write!(f, "{}", DictDisplay(d)),
        }
    }
}

/// Human-readable rendering of a dictionary, keys sorted.
pub struct DictDisplay<'a>(pub &'a Dict);

impl fmt::Display for DictDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&Vec<u8>> = self.0.keys().collect();
        keys.sort();
        f.write_str("{")?;
        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", key_text(key), ValueDisplay(&self.0[key]))?;
        }
        f.write_str("}")
    }
}
