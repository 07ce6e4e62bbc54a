mod common;

use std::time::Duration;

use common::{next_event, wait_for_event, wait_until};
use peerchat::constants::MAX_MESSAGE_LINE_BYTES;
use peerchat::network::handshake::Role;
use peerchat::network::session::{DisconnectReason, SessionEvent};
use peerchat::network::transport::resolve_dial_target;
use peerchat::{ChatNode, NodeOptions, PeerIdentity, SessionError};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

async fn start(alias: &str) -> (ChatNode, tokio::sync::mpsc::Receiver<SessionEvent>) {
    ChatNode::start(NodeOptions::new(alias).listen_addr("127.0.0.1:0"))
        .await
        .expect("node start")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn alice_and_bob_exchange_a_message() {
    let (alice, mut alice_events) = start("alice").await;
    let (bob, mut bob_events) = start("bob").await;
    let p = alice.listen_addr().port();

    let alice_id = bob.dial(&format!(":{}", p)).await.unwrap();
    assert_eq!(alice_id, PeerIdentity::new("alice", p));
    assert_eq!(bob.current_peer_names(), vec![alice_id.clone()]);

    let bob_id = match next_event(&mut alice_events).await {
        SessionEvent::Connected {
            peer,
            role,
            remote_addr,
        } => {
            assert_eq!(role, Role::Accepting);
            assert_eq!(peer, PeerIdentity::new("bob", remote_addr.port()));
            assert_ne!(remote_addr.port(), bob.listen_addr().port());
            peer
        }
        other => panic!("unexpected event {:?}", other),
    };
    assert_eq!(alice.current_peer_names(), vec![bob_id.clone()]);

    let report = alice.route("hello", std::slice::from_ref(&bob_id)).await;
    assert!(report.is_complete());

    let got = wait_for_event(&mut bob_events, |e| matches!(e, SessionEvent::Message { .. })).await;
    assert_eq!(
        got,
        SessionEvent::Message {
            from: alice_id,
            line: "hello".into()
        }
    );
}

#[tokio::test]
async fn dialing_own_address_is_rejected_before_connecting() {
    let (bob, mut bob_events) = start("bob").await;
    let port = bob.listen_addr().port();

    for target in [
        format!(":{}", port),
        format!("127.0.0.1:{}", port),
        format!("localhost:{}", port),
    ] {
        let err = bob.dial(&target).await.unwrap_err();
        assert!(
            matches!(err, SessionError::SelfConnect(_)),
            "{} -> {:?}",
            target,
            err
        );
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(bob.current_peer_names().is_empty());
    assert!(bob_events.try_recv().is_err(), "no inbound connection expected");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remote_close_removes_registry_entry() {
    let (alice, mut alice_events) = start("alice").await;
    let (bob, mut bob_events) = start("bob").await;

    let alice_id = bob
        .dial(&alice.listen_addr().to_string())
        .await
        .unwrap();
    let bob_id = match next_event(&mut alice_events).await {
        SessionEvent::Connected { peer, .. } => peer,
        other => panic!("unexpected event {:?}", other),
    };

    bob.disconnect(&alice_id).unwrap();
    assert!(bob.current_peer_names().is_empty());
    assert!(matches!(
        bob.disconnect(&alice_id),
        Err(SessionError::NotFound(_))
    ));

    let gone = wait_for_event(&mut alice_events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await;
    assert_eq!(
        gone,
        SessionEvent::Disconnected {
            peer: bob_id.clone(),
            reason: DisconnectReason::RemoteClosed
        }
    );
    assert!(wait_until(|| alice.current_peer_names().is_empty()).await);

    // The dead peer now reads as not found instead of a write to a dead socket.
    let report = alice.route("anyone?", std::slice::from_ref(&bob_id)).await;
    assert_eq!(report.missing, vec![bob_id]);

    let local = wait_for_event(&mut bob_events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await;
    assert!(matches!(
        local,
        SessionEvent::Disconnected {
            reason: DisconnectReason::LocalClose,
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn raw_peer_speaks_the_line_protocol() {
    let (alice, mut alice_events) = start("alice").await;
    let stream = TcpStream::connect(alice.listen_addr()).await.unwrap();
    let raw_port = stream.local_addr().unwrap().port();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Name and first message in a single write: nothing after the name line may be lost.
    write_half
        .write_all(b"/name carol\nfirst\n")
        .await
        .unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "/name alice\n");

    let carol = PeerIdentity::new("carol", raw_port);
    let msg = wait_for_event(&mut alice_events, |e| matches!(e, SessionEvent::Message { .. })).await;
    assert_eq!(
        msg,
        SessionEvent::Message {
            from: carol.clone(),
            line: "first".into()
        }
    );

    alice.route("welcome", std::slice::from_ref(&carol)).await;
    line.clear();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "welcome\n");

    drop(write_half);
    drop(reader);
    assert!(wait_until(|| !alice.registry().contains(&carol)).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_utf8_message_is_surfaced_and_session_survives() {
    let (alice, mut alice_events) = start("alice").await;
    let mut stream = TcpStream::connect(alice.listen_addr()).await.unwrap();
    let carol = PeerIdentity::new("carol", stream.local_addr().unwrap().port());

    stream.write_all(b"/name carol\n").await.unwrap();
    stream.write_all(b"caf\xe9\n").await.unwrap();
    stream.write_all(b"second\n").await.unwrap();

    let first = wait_for_event(&mut alice_events, |e| matches!(e, SessionEvent::Message { .. })).await;
    assert_eq!(
        first,
        SessionEvent::Message {
            from: carol.clone(),
            line: "caf\u{FFFD}".into()
        }
    );
    let second = next_event(&mut alice_events).await;
    assert_eq!(
        second,
        SessionEvent::Message {
            from: carol.clone(),
            line: "second".into()
        }
    );
    assert!(alice.registry().contains(&carol));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn over_long_message_line_drops_the_session() {
    let (alice, mut alice_events) = start("alice").await;
    let mut stream = TcpStream::connect(alice.listen_addr()).await.unwrap();
    let carol = PeerIdentity::new("carol", stream.local_addr().unwrap().port());
    stream.write_all(b"/name carol\n").await.unwrap();
    wait_for_event(&mut alice_events, |e| matches!(e, SessionEvent::Connected { .. })).await;

    let flood = vec![b'x'; MAX_MESSAGE_LINE_BYTES + 16];
    // Alice may close before the whole flood is written.
    let _ = stream.write_all(&flood).await;

    let gone = wait_for_event(&mut alice_events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await;
    assert!(matches!(
        gone,
        SessionEvent::Disconnected {
            reason: DisconnectReason::ReadError(_),
            ..
        }
    ));
    assert!(wait_until(|| !alice.registry().contains(&carol)).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hostname_dial_reaches_ipv4_only_listener() {
    let (alice, mut alice_events) = start("alice").await;
    let (bob, _bob_events) = start("bob").await;
    let p = alice.listen_addr().port();

    // "localhost" may resolve to ::1 first; alice only listens on 127.0.0.1.
    let targets = resolve_dial_target(&format!("localhost:{}", p), bob.listen_addr())
        .await
        .unwrap();
    assert!(targets.contains(&format!("127.0.0.1:{}", p).parse().unwrap()));

    let alice_id = bob.dial(&format!("localhost:{}", p)).await.unwrap();
    assert_eq!(alice_id, PeerIdentity::new("alice", p));
    wait_for_event(&mut alice_events, |e| matches!(e, SessionEvent::Connected { .. })).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_handshake_closes_connection_and_registers_nothing() {
    let (alice, _alice_events) = start("alice").await;
    let mut stream = TcpStream::connect(alice.listen_addr()).await.unwrap();
    stream.write_all(b"hello without a name\n").await.unwrap();

    // Alice's name line, then end-of-stream once she gives up on us.
    let mut received = Vec::new();
    tokio::time::timeout(common::WAIT, stream.read_to_end(&mut received))
        .await
        .expect("connection should be closed")
        .unwrap();
    assert_eq!(received, b"/name alice\n");
    assert!(alice.current_peer_names().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn receivers_are_validated_against_live_peers() {
    let (alice, mut alice_events) = start("alice").await;
    let (bob, _bob_events) = start("bob").await;
    bob.dial(&alice.listen_addr().to_string()).await.unwrap();
    let bob_id = match next_event(&mut alice_events).await {
        SessionEvent::Connected { peer, .. } => peer,
        other => panic!("unexpected event {:?}", other),
    };

    let ok = alice.resolve_receivers(&[bob_id.to_string()]).unwrap();
    assert_eq!(ok, vec![bob_id.clone()]);
    let err = alice
        .resolve_receivers(&[bob_id.to_string(), "zed:1".to_string()])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_closes_every_session() {
    let (alice, mut alice_events) = start("alice").await;
    let (bob, _bob_events) = start("bob").await;
    let (carol, _carol_events) = start("carol").await;
    bob.dial(&alice.listen_addr().to_string()).await.unwrap();
    carol.dial(&alice.listen_addr().to_string()).await.unwrap();
    for _ in 0..2 {
        wait_for_event(&mut alice_events, |e| matches!(e, SessionEvent::Connected { .. })).await;
    }

    assert_eq!(alice.shutdown(), 2);
    assert!(alice.current_peer_names().is_empty());
    assert!(wait_until(|| bob.current_peer_names().is_empty()).await);
    assert!(wait_until(|| carol.current_peer_names().is_empty()).await);
}

#[tokio::test]
async fn invalid_alias_is_rejected_at_start() {
    let res = ChatNode::start(NodeOptions::new("two words").listen_addr("127.0.0.1:0")).await;
    assert!(matches!(res, Err(SessionError::Config(_))));
    let res = ChatNode::start(NodeOptions::new("").listen_addr("127.0.0.1:0")).await;
    assert!(matches!(res, Err(SessionError::Config(_))));
}
