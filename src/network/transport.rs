// src/network/transport.rs

use std::net::SocketAddr;

use tokio::net::TcpStream;

use crate::error::{Result, SessionError};
use crate::events::model::LogLevel;
use crate::network::events::emit_network_event;
use crate::network::handshake::Role;
use crate::network::identity::PeerIdentity;
use crate::network::session::{establish_session, SessionContext};

/// Accept `:<port>` shorthand for the local host, as typed by users.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    match address.strip_prefix(':') {
        Some(port) => format!("127.0.0.1:{}", port),
        None => address.to_string(),
    }
}

/// True when `target` names this node's own listening socket.
///
/// A wildcard listener (`0.0.0.0` / `::`) is reachable through any local
/// address, so any loopback or unspecified target on the listen port counts.
pub fn is_self_address(target: &SocketAddr, listen: &SocketAddr) -> bool {
    if target.port() != listen.port() {
        return false;
    }
    let ip = target.ip();
    if ip == listen.ip() {
        return true;
    }
    let listen_is_local = listen.ip().is_unspecified() || listen.ip().is_loopback();
    listen_is_local && (ip.is_loopback() || ip.is_unspecified())
}

fn reject_self(address: &str, listen: SocketAddr) -> SessionError {
    emit_network_event(
        "transport",
        LogLevel::Warn,
        "dial_rejected_self",
        Some(address.to_string()),
        Some(format!("listen={}", listen)),
    );
    SessionError::SelfConnect(address.to_string())
}

/// Resolve the target to every address it names and refuse it if any of them
/// is our own listener. No socket is opened towards the target before this
/// check passes.
pub async fn resolve_dial_target(address: &str, listen: SocketAddr) -> Result<Vec<SocketAddr>> {
    let normalized = normalize_address(address);
    if normalized == listen.to_string() {
        return Err(reject_self(address, listen));
    }
    let targets: Vec<SocketAddr> = match normalized.parse::<SocketAddr>() {
        Ok(addr) => vec![addr],
        Err(_) => tokio::net::lookup_host(&normalized).await?.collect(),
    };
    if targets.is_empty() {
        return Err(SessionError::Transport(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("could not resolve {}", normalized),
        )));
    }
    if targets.iter().any(|target| is_self_address(target, &listen)) {
        return Err(reject_self(address, listen));
    }
    Ok(targets)
}

/// Open an outbound connection and run it through the shared session path
/// in the initiating role. Resolved addresses are tried in order until one
/// accepts.
pub async fn connect_to_peer(
    address: &str,
    listen: SocketAddr,
    ctx: &SessionContext,
) -> Result<PeerIdentity> {
    let targets = resolve_dial_target(address, listen).await?;
    let target_list = targets
        .iter()
        .map(SocketAddr::to_string)
        .collect::<Vec<_>>()
        .join(",");
    emit_network_event(
        "transport",
        LogLevel::Info,
        "dial_start",
        Some(target_list.clone()),
        Some(format!("requested={}", address)),
    );

    let stream = TcpStream::connect(&targets[..]).await.map_err(|e| {
        emit_network_event(
            "transport",
            LogLevel::Warn,
            "dial_failed",
            Some(target_list.clone()),
            Some(e.to_string()),
        );
        SessionError::Transport(e)
    })?;
    let local_addr = stream.local_addr()?;
    let remote_addr = stream.peer_addr()?;
    emit_network_event(
        "transport",
        LogLevel::Info,
        "tcp_connected",
        Some(remote_addr.to_string()),
        Some(format!("local={} remote={}", local_addr, remote_addr)),
    );

    establish_session(stream, Role::Initiating, ctx).await
}
