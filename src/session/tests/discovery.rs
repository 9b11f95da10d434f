//! Tests for catalog discovery and call engagement.

use super::*;

fn started_alive() -> Session<MemorySink> {
    let mut session = make_session();
    session.start(Instant::now()).unwrap();
    feed(&mut session, &pong()).unwrap();
    session.drain_outbox();
    session
}

fn page_number(message: &Dict) -> Option<i64> {
    match message.get(b"args".as_slice()) {
        Some(Value::Dict(args)) => match args.get(b"page".as_slice()) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        },
        _ => None,
    }
}

#[test]
fn test_discovery_pages_until_no_more() {
    let mut session = started_alive();

    feed(&mut session, &function_page(&[("A", &[])], true)).unwrap();
    let out = sent(&mut session);
    assert_eq!(out.len(), 1);
    assert_eq!(page_number(&out[0]), Some(1));

    feed(&mut session, &function_page(&[("B", &[])], true)).unwrap();
    let out = sent(&mut session);
    assert_eq!(page_number(&out[0]), Some(2));

    feed(&mut session, &function_page(&[("C", &[])], false)).unwrap();
    assert!(sent(&mut session).is_empty());

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.catalog().pages_received(), 3);
    assert_eq!(
        session.catalog().names().collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert!(session.sink().reports().contains(&Report::DiscoveryComplete {
        pages: 3,
        functions: 3
    }));
}

#[test]
fn test_late_page_after_ready_does_not_restart_discovery() {
    let mut session = started_alive();
    feed(&mut session, &function_page(&[("A", &[])], true)).unwrap();
    feed(&mut session, &function_page(&[("B", &[])], false)).unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    session.drain_outbox();

    // Retransmitted first page, still flagged as having more.
    feed(&mut session, &function_page(&[("A", &[]), ("Z", &[])], true)).unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert!(sent(&mut session).is_empty());
    assert_eq!(session.catalog().pages_received(), 2);
    assert!(session.catalog().contains("Z"));

    let discoveries = session
        .sink()
        .reports()
        .iter()
        .filter(|r| matches!(r, Report::DiscoveryComplete { .. }))
        .count();
    assert_eq!(discoveries, 1);

    let txid = session.call("A", &Args::new()).unwrap();
    assert!(session.pending_call(&txid).is_some());
}

#[test]
fn test_engage_before_ready() {
    let mut session = started_alive();
    assert!(matches!(
        session.call("A", &Args::new()),
        Err(SessionError::NotReady(SessionState::Discovering))
    ));
}

#[test]
fn test_engage_registers_and_requests_cookie() {
    let mut session = make_ready_session();
    let mut overrides = Args::new();
    overrides.insert("path".to_string(), bytes("0000.0000.0000.0013"));

    let txid = session.call(protocol::FN_SWITCH_PING, &overrides).unwrap();

    let call = session.pending_call(&txid).unwrap();
    assert_eq!(call.function, protocol::FN_SWITCH_PING);
    assert_eq!(call.args.get("path"), Some(&bytes("0000.0000.0000.0013")));
    assert_eq!(call.args.get("timeout"), Some(&Value::Int(0)));

    let out = sent(&mut session);
    assert_eq!(out.len(), 1);
    assert_eq!(query(&out[0]), "cookie");
    assert_eq!(get_str(&out[0], "txid"), Some(txid.as_str()));
}

#[test]
fn test_engage_unknown_function() {
    let mut session = make_ready_session();
    let result = session.call("Nope_nothing", &Args::new());
    assert!(matches!(result, Err(SessionError::UnknownFunction(name)) if name == "Nope_nothing"));
    assert_eq!(session.pending_count(), 0);
    assert!(session.drain_outbox().is_empty());
}

#[test]
fn test_engage_duplicate_txid() {
    let mut session = make_ready_session();
    let txid = Txid::from("DUPLICATE0");
    session
        .engage(protocol::FN_NODE_FOR_ADDR, Some(txid.clone()), None, &Args::new())
        .unwrap();
    let result = session.engage(protocol::FN_NODE_FOR_ADDR, Some(txid), None, &Args::new());
    assert!(matches!(result, Err(SessionError::DuplicateTxid(_))));
    assert_eq!(session.pending_count(), 1);
}

#[test]
fn test_engage_cursor_precedence() {
    let mut session = make_ready_session();
    let mut overrides = Args::new();
    overrides.insert("page".to_string(), Value::Int(4));

    let txid = session
        .engage(protocol::FN_DUMP_TABLE, None, Some(9), &overrides)
        .unwrap();
    let call = session.pending_call(&txid).unwrap();
    assert_eq!(call.args.get("page"), Some(&Value::Int(9)));
    assert_eq!(call.cursor, Some(9));
}

#[test]
fn test_engage_drops_unknown_keys() {
    let mut session = make_ready_session();
    let mut overrides = Args::new();
    overrides.insert("bogus".to_string(), Value::Int(1));

    let txid = session.call(protocol::FN_NODE_FOR_ADDR, &overrides).unwrap();
    assert!(!session.pending_call(&txid).unwrap().args.contains_key("bogus"));
}

#[test]
fn test_startup_calls_run_when_ready() {
    let mut config = make_config();
    config
        .admin
        .calls
        .push(CallConfig::new("InterfaceController_peerStats"));
    config.admin.log_level = Some("DEBUG".to_string());

    let mut session = Session::new(&config, MemorySink::new()).unwrap();
    session.start(Instant::now()).unwrap();
    feed(&mut session, &pong()).unwrap();
    session.drain_outbox();
    feed(&mut session, &standard_functions()).unwrap();

    let out = sent(&mut session);
    assert_eq!(out.iter().filter(|m| query(m) == "cookie").count(), 2);
    assert_eq!(session.pending_count(), 2);
}

#[test]
fn test_unknown_startup_call_fails_loudly() {
    let mut config = make_config();
    config.admin.calls.push(CallConfig::new("Missing_function"));

    let mut session = Session::new(&config, MemorySink::new()).unwrap();
    session.start(Instant::now()).unwrap();
    feed(&mut session, &pong()).unwrap();

    let result = feed(&mut session, &standard_functions());
    assert!(matches!(result, Err(SessionError::UnknownFunction(_))));
}

#[test]
fn test_queue_call_after_ready_engages_immediately() {
    let mut session = make_ready_session();
    session
        .queue_call(CallConfig::new(protocol::FN_DUMP_TABLE))
        .unwrap();
    assert_eq!(session.pending_count(), 1);
}
