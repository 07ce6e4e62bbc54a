// src/network/session.rs

//! Session lifecycle shared by the acceptor and the dialer: handshake,
//! registration, and the per-peer receive loop that tears the session down.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::constants::MAX_MESSAGE_LINE_BYTES;
use crate::error::Result;
use crate::events::model::{ConnectionRole, LogLevel};
use crate::network::connection::{Connection, LineReader};
use crate::network::events::{emit_network_event, emit_system_event};
use crate::network::handshake::{self, Role};
use crate::network::identity::PeerIdentity;
use crate::network::registry::PeerRegistry;

/// Notifications delivered to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected {
        peer: PeerIdentity,
        role: Role,
        remote_addr: SocketAddr,
    },
    Message {
        from: PeerIdentity,
        line: String,
    },
    Disconnected {
        peer: PeerIdentity,
        reason: DisconnectReason,
    },
}

/// Why a receive loop reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer closed the stream cleanly.
    RemoteClosed,
    /// Read failed or the peer sent an over-long line.
    ReadError(String),
    /// Closed from this side (disconnect, replacement, shutdown).
    LocalClose,
}

/// Everything a new session needs from the node.
#[derive(Clone)]
pub struct SessionContext {
    pub local_alias: Arc<str>,
    pub registry: PeerRegistry,
    pub events: mpsc::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(
        local_alias: impl Into<Arc<str>>,
        registry: PeerRegistry,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            local_alias: local_alias.into(),
            registry,
            events,
        }
    }
}

/// Handshake a raw stream, register it, and spawn its receive loop.
///
/// Any failure closes the stream before the error is returned.
pub async fn establish_session(
    stream: TcpStream,
    role: Role,
    ctx: &SessionContext,
) -> Result<PeerIdentity> {
    let (connection, mut reader) = Connection::split(stream)?;
    let connection = Arc::new(connection);
    let remote_addr = connection.remote_addr();

    let identity =
        match handshake::exchange_names(&connection, &mut reader, &ctx.local_alias, role).await {
            Ok(identity) => identity,
            Err(e) => {
                connection.close();
                emit_network_event(
                    "session",
                    LogLevel::Warn,
                    "handshake_failed",
                    Some(remote_addr.to_string()),
                    Some(format!("role={:?} err={}", ConnectionRole::from(role), e)),
                );
                return Err(e);
            }
        };

    if let Err(e) = ctx.registry.add(identity.clone(), connection.clone()) {
        connection.close();
        emit_network_event(
            "session",
            LogLevel::Warn,
            "peer_collision",
            Some(remote_addr.to_string()),
            Some(format!("peer={} err={}", identity, e)),
        );
        return Err(e);
    }
    emit_network_event(
        "session",
        LogLevel::Info,
        "peer_registered",
        Some(remote_addr.to_string()),
        Some(format!("peer={} role={:?}", identity, ConnectionRole::from(role))),
    );

    let _ = ctx
        .events
        .send(SessionEvent::Connected {
            peer: identity.clone(),
            role,
            remote_addr,
        })
        .await;

    tokio::spawn(receive_loop(
        identity.clone(),
        connection,
        reader,
        ctx.clone(),
    ));
    Ok(identity)
}

/// Read lines until the stream ends or the connection is closed locally, then
/// close the connection and drop the registry entry if it is still ours.
pub async fn receive_loop(
    identity: PeerIdentity,
    connection: Arc<Connection>,
    reader: LineReader,
    ctx: SessionContext,
) -> DisconnectReason {
    let addr = connection.remote_addr();
    let mut closed = connection.close_signal();
    let mut reader = reader.take(MAX_MESSAGE_LINE_BYTES as u64);
    let mut line: Vec<u8> = Vec::new();

    let reason = loop {
        if connection.is_closed() {
            break DisconnectReason::LocalClose;
        }
        line.clear();
        reader.set_limit(MAX_MESSAGE_LINE_BYTES as u64);
        tokio::select! {
            res = reader.read_until(b'\n', &mut line) => match res {
                Ok(0) => break DisconnectReason::RemoteClosed,
                Ok(n) if n == MAX_MESSAGE_LINE_BYTES && line.last() != Some(&b'\n') => {
                    break DisconnectReason::ReadError(format!(
                        "line exceeds {} bytes",
                        MAX_MESSAGE_LINE_BYTES
                    ));
                }
                Ok(_) => {
                    // Message bodies are opaque; invalid UTF-8 is surfaced, not fatal.
                    let text = String::from_utf8_lossy(&line)
                        .trim_end_matches(&['\r', '\n'][..])
                        .to_string();
                    let _ = ctx
                        .events
                        .send(SessionEvent::Message {
                            from: identity.clone(),
                            line: text,
                        })
                        .await;
                }
                Err(e) => break DisconnectReason::ReadError(e.to_string()),
            },
            _ = closed.changed() => break DisconnectReason::LocalClose,
        }
    };
    drop(reader);

    connection.close();
    let removed = ctx.registry.remove_if_current(&identity, &connection);

    let (level, action) = match &reason {
        DisconnectReason::ReadError(_) => (LogLevel::Warn, "peer_read_error"),
        _ => (LogLevel::Info, "peer_disconnected"),
    };
    emit_network_event(
        "session",
        level,
        action,
        Some(addr.to_string()),
        Some(format!("peer={} reason={:?}", identity, reason)),
    );
    if removed {
        emit_system_event(
            "session",
            LogLevel::Info,
            "peer_removed",
            Some(format!("peer={} addr={}", identity, addr)),
        );
    }

    let _ = ctx
        .events
        .send(SessionEvent::Disconnected {
            peer: identity,
            reason: reason.clone(),
        })
        .await;
    reason
}
