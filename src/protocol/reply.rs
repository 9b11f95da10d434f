//! Reply classification.
//!
//! The daemon's replies have no type tag; their kind follows from which
//! fields are present. [`Reply::classify`] decides that once, in a fixed
//! priority order, so each inbound message is handled by exactly one path.

use super::{get, get_str, has, txid_of, Args, Dict, ProtocolError};
use crate::utils::Txid;
use serde_bencode::value::Value;
use std::collections::BTreeMap;

/// Function name → argument defaults, as delivered by one catalog page.
pub type FunctionEntries = BTreeMap<String, Args>;

/// What an inbound message is.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyKind {
    /// `{q: "pong"}`
    Pong,
    /// One page of `availableFunctions`, `more` when another page follows.
    FunctionPage { functions: FunctionEntries, more: bool },
    /// A cookie issued for a pending call.
    Cookie { cookie: String },
    /// A peer list, one dictionary per peer.
    Peers { peers: Vec<Dict> },
    /// One page of a routing table dump.
    RoutingTablePage { routes: Vec<Dict>, more: bool },
    /// Any other correlated reply or result.
    Response { result: Option<Value> },
    /// Nothing we know how to interpret.
    Unrecognized,
}

impl ReplyKind {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ReplyKind::Pong => "pong",
            ReplyKind::FunctionPage { .. } => "function_page",
            ReplyKind::Cookie { .. } => "cookie",
            ReplyKind::Peers { .. } => "peers",
            ReplyKind::RoutingTablePage { .. } => "routing_table_page",
            ReplyKind::Response { .. } => "response",
            ReplyKind::Unrecognized => "unrecognized",
        }
    }
}

/// A classified inbound message.
#[derive(Clone, Debug)]
pub struct Reply {
    /// Correlation id echoed by the daemon.
    pub txid: Option<Txid>,
    /// The message kind.
    pub kind: ReplyKind,
    /// The full decoded message, for verbatim presentation.
    pub message: Dict,
}

impl Reply {
    /// Classify a decoded message.
    ///
    /// Priority: pong, function page, cookie, peers, routing table page,
    /// then any message carrying `txid` or `result` is a response.
    pub fn classify(message: Dict) -> Result<Self, ProtocolError> {
        let txid = txid_of(&message);
        let more = has(&message, "more");

        let kind = if get_str(&message, "q") == Some("pong") {
            ReplyKind::Pong
        } else if let Some(value) = get(&message, "availableFunctions") {
            ReplyKind::FunctionPage {
                functions: parse_functions(value)?,
                more,
            }
        } else if let Some(value) = get(&message, "cookie") {
            ReplyKind::Cookie {
                cookie: parse_text(value, "cookie")?,
            }
        } else if let Some(value) = get(&message, "peers") {
            ReplyKind::Peers {
                peers: parse_dict_list(value, "peers")?,
            }
        } else if let Some(value) = get(&message, "routingTable") {
            ReplyKind::RoutingTablePage {
                routes: parse_dict_list(value, "routingTable")?,
                more,
            }
        } else if txid.is_some() || has(&message, "result") {
            ReplyKind::Response {
                result: get(&message, "result").cloned(),
            }
        } else {
            ReplyKind::Unrecognized
        };

        Ok(Self {
            txid,
            kind,
            message,
        })
    }
}

/// Lossy text form of a byte-string key.
pub(crate) fn key_text(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

fn parse_text(value: &Value, field: &'static str) -> Result<String, ProtocolError> {
    match value {
        Value::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| ProtocolError::FieldType {
            field,
            expected: "utf-8 string",
        }),
        _ => Err(ProtocolError::FieldType {
            field,
            expected: "string",
        }),
    }
}

fn parse_functions(value: &Value) -> Result<FunctionEntries, ProtocolError> {
    let Value::Dict(functions) = value else {
        return Err(ProtocolError::FieldType {
            field: "availableFunctions",
            expected: "dictionary",
        });
    };

    let mut entries = FunctionEntries::new();
    for (name, spec) in functions {
        let Value::Dict(arg_specs) = spec else {
            return Err(ProtocolError::FieldType {
                field: "availableFunctions",
                expected: "dictionary of dictionaries",
            });
        };
        let args = arg_specs
            .iter()
            .map(|(arg, default)| (key_text(arg), default.clone()))
            .collect();
        entries.insert(key_text(name), args);
    }
    Ok(entries)
}

fn parse_dict_list(value: &Value, field: &'static str) -> Result<Vec<Dict>, ProtocolError> {
    let Value::List(items) = value else {
        return Err(ProtocolError::FieldType {
            field,
            expected: "list",
        });
    };

    items
        .iter()
        .map(|item| match item {
            Value::Dict(d) => Ok(d.clone()),
            _ => Err(ProtocolError::FieldType {
                field,
                expected: "list of dictionaries",
            }),
        })
        .collect()
}
