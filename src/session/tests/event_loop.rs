//! End-to-end tests against a fake admin endpoint on localhost.

use super::*;
use crate::transport::packet_channel;
use crate::transport::udp::UdpTransport;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

const COOKIE: &str = "1700000000";

/// Verify an auth envelope the way the daemon does.
fn verify_auth(message: &Dict) -> bool {
    let Some(claimed) = get_str(message, "hash").map(str::to_string) else {
        return false;
    };
    let Some(cookie) = get_str(message, "cookie") else {
        return false;
    };
    let cookie_hash = hex::encode(Sha256::digest(format!("{}{}", SECRET, cookie)));

    let mut envelope = message.clone();
    envelope.insert(b"hash".to_vec(), bytes(&cookie_hash));
    let expected = hex::encode(Sha256::digest(encode(&Value::Dict(envelope)).unwrap()));
    claimed == expected
}

/// Answer admin requests until the client goes quiet.
///
/// Returns the `q` of every request received, in order.
async fn fake_daemon(socket: Arc<UdpSocket>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut buf = vec![0u8; 65536];

    loop {
        let recv = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await;
        let Ok(Ok((len, from))) = recv else {
            break;
        };
        let message = decode(&buf[..len]).unwrap();
        let q = query(&message).to_string();
        let txid = get_str(&message, "txid").unwrap_or("").to_string();

        let reply = match q.as_str() {
            "ping" => Some(pong()),
            protocol::FN_AVAILABLE_FUNCTIONS => Some(function_page(
                &[(protocol::FN_NODE_FOR_ADDR, &[("ip", bytes(""))])],
                false,
            )),
            "cookie" => Some(dict([("cookie", bytes(COOKIE)), ("txid", bytes(&txid))])),
            "auth" => {
                let result = if verify_auth(&message) { "ok" } else { "bad hash" };
                Some(dict([
                    ("error", bytes("none")),
                    ("result", bytes(result)),
                    ("txid", bytes(&txid)),
                ]))
            }
            _ => None,
        };
        seen.push(q);

        if let Some(reply) = reply {
            socket.send_to(&encode(&reply).unwrap(), from).await.unwrap();
        }
    }
    seen
}

fn fast_config(port: u16) -> Config {
    let mut config = make_config();
    config.admin.host = Some("127.0.0.1".to_string());
    config.admin.port = Some(port);
    config.admin.tick_interval_ms = Some(50);
    config.admin.ping_check_ms = Some(50);
    config
}

#[tokio::test]
async fn test_full_session_against_fake_daemon() {
    let daemon = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let port = daemon.local_addr().unwrap().port();
    let daemon_task = tokio::spawn(fake_daemon(daemon.clone()));

    let mut config = fast_config(port);
    let mut call = CallConfig::new(protocol::FN_NODE_FOR_ADDR);
    call.args.insert(
        "ip".to_string(),
        crate::config::ArgValue::Str("fc00::1".to_string()),
    );
    config.admin.calls.push(call);

    let mut session = Session::new(&config, MemorySink::new()).unwrap();
    let (packet_tx, mut packet_rx) = packet_channel(64);
    let mut transport = UdpTransport::new(
        session.remote_addr(),
        config.transports.udp.clone(),
        packet_tx,
    );
    transport.start_async().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        session.run(&mut transport, &mut packet_rx),
    )
    .await
    .expect("session did not go idle")
    .unwrap();

    assert!(session.state().is_stopped());
    assert!(!transport.state().is_operational());

    let reports = session.sink().reports();
    assert!(reports.contains(&Report::DiscoveryComplete {
        pages: 1,
        functions: 1
    }));
    assert!(reports.contains(&Report::CallCompleted {
        function: Some(protocol::FN_NODE_FOR_ADDR.to_string())
    }));
    let node_info = reports
        .iter()
        .find_map(|r| match r {
            Report::NodeInfo { message } => Some(message.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(get_str(&node_info, "result"), Some("ok"));
    assert!(matches!(reports.last(), Some(Report::Stopping { .. })));

    let seen = daemon_task.await.unwrap();
    assert_eq!(seen.first().map(String::as_str), Some("ping"));
    assert_eq!(
        seen.iter()
            .filter(|q| q.as_str() == protocol::FN_AVAILABLE_FUNCTIONS)
            .count(),
        1
    );
    assert_eq!(seen.iter().filter(|q| q.as_str() == "cookie").count(), 1);
    assert_eq!(seen.iter().filter(|q| q.as_str() == "auth").count(), 1);
}

#[tokio::test]
async fn test_silent_endpoint_times_out() {
    // Bound but never answers.
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let config = fast_config(silent.local_addr().unwrap().port());

    let mut session = Session::new(&config, MemorySink::new()).unwrap();
    let (packet_tx, mut packet_rx) = packet_channel(64);
    let mut transport = UdpTransport::new(
        session.remote_addr(),
        config.transports.udp.clone(),
        packet_tx,
    );
    transport.start_async().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        session.run(&mut transport, &mut packet_rx),
    )
    .await
    .expect("session did not time out")
    .unwrap();

    assert!(!session.ponged());
    assert_eq!(
        session.sink().reports(),
        &[Report::Stopping {
            reason: "No activity".to_string()
        }]
    );

    // Pings kept coming until the countdown ran out.
    let mut buf = [0u8; 64];
    let (len, _) = silent.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], b"d1:q4:pinge");
}
