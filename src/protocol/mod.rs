//! Admin Protocol Messages
//!
//! Every admin message is a bencoded dictionary. This module is the codec
//! adapter around `serde_bencode`: decoding to a raw [`Dict`], typed field
//! accessors, and builders for the fixed request shapes.
//!
//! ## Request Shapes
//!
//! ```text
//! {q: "ping"}
//! {q: "cookie", txid}
//! {q: "Admin_availableFunctions", args: {page}}
//! {q: "auth", aq: <function>, hash, cookie, args, txid}
//! ```
//!
//! Replies are told apart only by which fields they carry; see [`reply`].

pub mod auth;
mod error;
pub mod reply;

use crate::utils::Txid;
use serde_bencode::value::Value;
use std::collections::{BTreeMap, HashMap};

pub use auth::{sign_call, SignedCall};
pub use error::ProtocolError;
pub use reply::{Reply, ReplyKind};
pub(crate) use reply::key_text;

/// A decoded bencode dictionary.
pub type Dict = HashMap<Vec<u8>, Value>;

/// Call arguments, ordered for stable presentation.
pub type Args = BTreeMap<String, Value>;

// ============================================================================
// Well-known names
// ============================================================================

/// Catalog discovery query.
pub const FN_AVAILABLE_FUNCTIONS: &str = "Admin_availableFunctions";
/// Route lookup for a single address.
pub const FN_ROUTE_LOOKUP: &str = "RouterModule_lookup";
/// Paginated routing table dump.
pub const FN_DUMP_TABLE: &str = "NodeStore_dumpTable";
/// Node information for a single address.
pub const FN_NODE_FOR_ADDR: &str = "NodeStore_nodeForAddr";
/// Switch-level ping.
pub const FN_SWITCH_PING: &str = "SwitchPinger_ping";
/// Router-level ping.
pub const FN_PING_NODE: &str = "RouterModule_pingNode";
/// Ethernet connection establishment.
pub const FN_BEGIN_CONNECTION: &str = "ETHInterface_beginConnection";
/// Daemon log subscription.
pub const FN_LOG_SUBSCRIBE: &str = "AdminLog_subscribe";

/// Argument name carrying a pagination cursor.
pub const PAGE_ARG: &str = "page";

// ============================================================================
// Codec adapter
// ============================================================================

/// Encode a message to its wire form.
///
/// Dictionary keys are emitted sorted, so equal messages always produce
/// equal bytes.
pub fn encode(message: &Value) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_bencode::to_bytes(message)?)
}

/// Decode a datagram into its top-level dictionary.
pub fn decode(data: &[u8]) -> Result<Dict, ProtocolError> {
    match serde_bencode::from_bytes::<Value>(data)? {
        Value::Dict(dict) => Ok(dict),
        _ => Err(ProtocolError::NotADictionary),
    }
}

// ============================================================================
// Field accessors
// ============================================================================

/// Look up a field by name.
pub fn get<'a>(dict: &'a Dict, key: &str) -> Option<&'a Value> {
    dict.get(key.as_bytes())
}

/// Check whether a field is present, whatever its value.
pub fn has(dict: &Dict, key: &str) -> bool {
    dict.contains_key(key.as_bytes())
}

/// Look up a byte-string field as UTF-8.
pub fn get_str<'a>(dict: &'a Dict, key: &str) -> Option<&'a str> {
    match get(dict, key) {
        Some(Value::Bytes(b)) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

/// Look up an integer field.
pub fn get_int(dict: &Dict, key: &str) -> Option<i64> {
    match get(dict, key) {
        Some(Value::Int(n)) => Some(*n),
        _ => None,
    }
}

/// Read the correlation id of a message, if any.
pub fn txid_of(dict: &Dict) -> Option<Txid> {
    get_str(dict, "txid").map(Txid::from)
}

// ============================================================================
// Builders
// ============================================================================

/// A byte-string value from text.
pub fn bytes(s: &str) -> Value {
    Value::Bytes(s.as_bytes().to_vec())
}

/// Build a dictionary value from `(key, value)` pairs.
pub fn dict<'a, I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    Value::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (k.as_bytes().to_vec(), v))
            .collect(),
    )
}

/// Convert call arguments to a dictionary value.
pub fn args_value(args: &Args) -> Value {
    Value::Dict(
        args.iter()
            .map(|(k, v)| (k.as_bytes().to_vec(), v.clone()))
            .collect(),
    )
}

/// `{q: "ping"}`
pub fn ping_request() -> Value {
    dict([("q", bytes("ping"))])
}

/// `{q: "cookie", txid}`
pub fn cookie_request(txid: &Txid) -> Value {
    dict([("q", bytes("cookie")), ("txid", bytes(txid.as_str()))])
}

/// `{q: "Admin_availableFunctions", args: {page}}`
pub fn available_functions_request(page: u32) -> Value {
    dict([
        ("q", bytes(FN_AVAILABLE_FUNCTIONS)),
        ("args", dict([(PAGE_ARG, Value::Int(i64::from(page)))])),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_wire_form() {
        assert_eq!(encode(&ping_request()).unwrap(), b"d1:q4:pinge");
    }

    #[test]
    fn test_cookie_wire_form() {
        let bytes = encode(&cookie_request(&Txid::from("ABCDEFGHIJ"))).unwrap();
        assert_eq!(bytes, b"d1:q6:cookie4:txid10:ABCDEFGHIJe");
    }

    #[test]
    fn test_available_functions_wire_form() {
        let bytes = encode(&available_functions_request(2)).unwrap();
        assert_eq!(bytes, b"d4:argsd4:pagei2ee1:q24:Admin_availableFunctionse");
    }

    #[test]
    fn test_decode_dict() {
        let dict = decode(b"d1:q4:pong4:txid3:ABCe").unwrap();
        assert_eq!(get_str(&dict, "q"), Some("pong"));
        assert_eq!(txid_of(&dict), Some(Txid::from("ABC")));
        assert!(has(&dict, "txid"));
        assert!(!has(&dict, "cookie"));
    }

    #[test]
    fn test_decode_rejects_non_dict() {
        assert!(matches!(decode(b"i42e"), Err(ProtocolError::NotADictionary)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not bencode"), Err(ProtocolError::Bencode(_))));
        assert!(decode(b"").is_err());
    }

    #[test]
    fn test_get_int() {
        let dict = decode(b"d4:pagei7e1:s3:abce").unwrap();
        assert_eq!(get_int(&dict, "page"), Some(7));
        assert_eq!(get_int(&dict, "s"), None);
    }
}
