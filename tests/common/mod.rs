#![allow(dead_code)]

use std::time::Duration;

use peerchat::network::connection::{Connection, LineReader};
use peerchat::network::session::SessionEvent;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(5);

/// A connected loopback pair: our side split into a `Connection`, the far side raw.
pub async fn connection_pair() -> (Connection, LineReader, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    let (conn, reader) = Connection::split(client.unwrap()).unwrap();
    (conn, reader, accepted.unwrap().0)
}

pub async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("session event channel closed")
}

/// Skip events until one matches `pred`.
pub async fn wait_for_event<F>(rx: &mut mpsc::Receiver<SessionEvent>, pred: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Poll `cond` every 20ms for up to five seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
