mod common;

use parking_lot::Mutex;
use std::sync::Arc;

use peerchat::events::{dispatcher, model::LogEvent, sink::LogSink};
use peerchat::network::session::SessionEvent;
use peerchat::{ChatNode, NodeOptions, PeerIdentity};

struct MemorySink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

#[async_trait::async_trait]
impl LogSink for MemorySink {
    async fn handle(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}

impl MemorySink {
    fn has(&self, action: &str) -> bool {
        self.events.lock().iter().any(|e| e.action() == action)
    }
}

// Single test per binary: the global dispatcher lives on the first runtime that installs it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_lifecycle_is_logged() {
    let mem = Arc::new(MemorySink {
        events: Arc::new(Mutex::new(Vec::new())),
    });
    dispatcher::init_events(vec![mem.clone()], 256).await;

    let (alice, mut alice_events) =
        ChatNode::start(NodeOptions::new("alice").listen_addr("127.0.0.1:0"))
            .await
            .unwrap();
    let (bob, _bob_events) = ChatNode::start(NodeOptions::new("bob").listen_addr("127.0.0.1:0"))
        .await
        .unwrap();

    let alice_id = bob.dial(&alice.listen_addr().to_string()).await.unwrap();
    common::wait_for_event(&mut alice_events, |e| {
        matches!(e, SessionEvent::Connected { .. })
    })
    .await;

    let _ = bob.dial(&format!(":{}", bob.listen_addr().port())).await;
    bob.route("ping", &[PeerIdentity::new("ghost", 1)]).await;
    bob.disconnect(&alice_id).unwrap();
    common::wait_for_event(&mut alice_events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await;

    for action in [
        "node_started",
        "listener_bind",
        "dial_start",
        "tcp_connected",
        "handshake_success",
        "peer_registered",
        "dial_rejected_self",
        "route_peer_not_found",
        "peer_disconnect_requested",
        "peer_disconnected",
        "peer_removed",
    ] {
        assert!(
            common::wait_until(|| mem.has(action)).await,
            "missing event action {}",
            action
        );
    }

    let events = mem.events.lock();
    let registered = events
        .iter()
        .filter(|e| e.action() == "peer_registered")
        .count();
    assert_eq!(registered, 2, "one registration on each side");
    assert!(events
        .iter()
        .all(|e| e.meta().corr_id.as_deref().map(str::len) == Some(8)));
}
