use super::*;
use crate::protocol::{bytes, decode, dict, encode, get_str, Dict};
use crate::report::{MemorySink, Report};
use std::time::Instant;

mod discovery;
mod event_loop;

pub(super) const SECRET: &str = "hunter2";

pub(super) fn make_config() -> Config {
    let mut config = Config::new();
    config.admin.password = Some(SECRET.to_string());
    config
}

pub(super) fn make_session() -> Session<MemorySink> {
    Session::new(&make_config(), MemorySink::new()).unwrap()
}

/// Encode and deliver a message to the session.
pub(super) fn feed(session: &mut Session<MemorySink>, message: &Value) -> Result<(), SessionError> {
    session.on_datagram(&encode(message).unwrap())
}

/// Decode everything the session queued for sending.
pub(super) fn sent(session: &mut Session<MemorySink>) -> Vec<Dict> {
    session
        .drain_outbox()
        .iter()
        .map(|d| decode(d).unwrap())
        .collect()
}

/// The `q` field of a sent message.
pub(super) fn query(message: &Dict) -> &str {
    get_str(message, "q").unwrap_or("")
}

pub(super) fn pong() -> Value {
    dict([("q", bytes("pong"))])
}

/// One `availableFunctions` page.
pub(super) fn function_page(functions: &[(&str, &[(&str, Value)])], more: bool) -> Value {
    let entries = dict(
        functions
            .iter()
            .map(|(name, args)| (*name, dict(args.iter().map(|(k, v)| (*k, v.clone()))))),
    );
    let mut fields = vec![("availableFunctions", entries)];
    if more {
        fields.push(("more", Value::Int(1)));
    }
    dict(fields)
}

pub(super) fn cookie_reply(txid: &Txid, cookie: &str) -> Value {
    dict([("cookie", bytes(cookie)), ("txid", bytes(txid.as_str()))])
}

/// The functions a typical daemon offers, with simple defaults.
pub(super) fn standard_functions() -> Value {
    function_page(
        &[
            (protocol::FN_ROUTE_LOOKUP, &[("address", bytes(""))]),
            (protocol::FN_DUMP_TABLE, &[("page", Value::Int(0))]),
            (protocol::FN_NODE_FOR_ADDR, &[("ip", bytes(""))]),
            (
                protocol::FN_SWITCH_PING,
                &[("path", bytes("")), ("timeout", Value::Int(0))],
            ),
            (
                protocol::FN_PING_NODE,
                &[("path", bytes("")), ("timeout", Value::Int(0))],
            ),
            (
                protocol::FN_BEGIN_CONNECTION,
                &[("macAddress", bytes("")), ("publicKey", bytes(""))],
            ),
            (protocol::FN_LOG_SUBSCRIBE, &[("level", bytes(""))]),
            ("InterfaceController_peerStats", &[("page", Value::Int(0))]),
        ],
        false,
    )
}

/// A session past discovery with outbox and reports cleared.
pub(super) fn make_ready_session() -> Session<MemorySink> {
    let mut session = make_session();
    session.start(Instant::now()).unwrap();
    feed(&mut session, &pong()).unwrap();
    feed(&mut session, &standard_functions()).unwrap();
    assert!(session.state().is_ready());
    session.drain_outbox();
    session.sink_mut().drain();
    session
}

/// Engage `function` and answer its cookie, returning the txid.
pub(super) fn engage_and_sign(
    session: &mut Session<MemorySink>,
    function: &str,
    overrides: &Args,
) -> Txid {
    let txid = session.call(function, overrides).unwrap();
    feed(session, &cookie_reply(&txid, "1234567890")).unwrap();
    session.drain_outbox();
    txid
}

pub(super) fn reports(session: &mut Session<MemorySink>) -> Vec<Report> {
    session.sink_mut().drain()
}
