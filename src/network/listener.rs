// src/network/listener.rs

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::events::model::LogLevel;
use crate::network::events::emit_network_event;
use crate::network::handshake::Role;
use crate::network::session::{establish_session, SessionContext};

/// Pause after a failed accept so resource exhaustion does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

fn log_network_event(level: LogLevel, action: &str, addr: Option<String>, detail: Option<String>) {
    emit_network_event("listener", level, action, addr, detail);
}

/// Bind the listening socket. Failure here is the caller's to treat as fatal.
pub async fn bind_listener(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    log_network_event(
        LogLevel::Info,
        "listener_bind",
        Some(local.to_string()),
        Some(format!("requested={}", addr)),
    );
    Ok(listener)
}

/// Accept inbound connections forever. Each one is handshaken on its own task
/// so a stalled peer only stalls its own handshake.
pub async fn run_acceptor(listener: TcpListener, ctx: SessionContext) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                log_network_event(
                    LogLevel::Info,
                    "incoming_connection",
                    Some(peer_addr.to_string()),
                    None,
                );
                tokio::spawn(handle_connection(stream, peer_addr, ctx.clone()));
            }
            Err(e) => {
                log_network_event(LogLevel::Error, "accept_failed", None, Some(e.to_string()));
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: SessionContext) {
    // establish_session closes the stream and logs the cause on failure.
    if let Err(e) = establish_session(stream, Role::Accepting, &ctx).await {
        log_network_event(
            LogLevel::Debug,
            "inbound_session_aborted",
            Some(peer_addr.to_string()),
            Some(e.to_string()),
        );
    }
}
