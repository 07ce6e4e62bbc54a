// src/network/handshake.rs

//! One-shot name exchange that turns an anonymous stream into a named peer.
//!
//! Both sides send `/name <alias>\n` first and then read the peer's line. There
//! is no leader: the exchange is symmetric and relies on socket buffering, so an
//! accepting and an initiating node run exactly the same steps.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::constants::{MAX_NAME_LINE_BYTES, NAME_COMMAND_PREFIX};
use crate::error::{Result, SessionError};
use crate::events::model::{ConnectionRole, LogLevel};
use crate::network::connection::{Connection, LineReader};
use crate::network::events::emit_network_event;
use crate::network::identity::{validate_alias, PeerIdentity};

/// Which side of the TCP connection this node is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Accepting,
    Initiating,
}

impl From<Role> for ConnectionRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Accepting => ConnectionRole::Inbound,
            Role::Initiating => ConnectionRole::Outbound,
        }
    }
}

/// The line this node announces itself with (without the newline).
pub fn name_line(local_alias: &str) -> String {
    format!("{}{}", NAME_COMMAND_PREFIX, local_alias)
}

/// Extract the alias from a received handshake line.
///
/// The line (surrounding whitespace trimmed) must start with `/name ` and split
/// on single spaces into exactly two tokens.
pub fn parse_name_line(line: &str) -> Result<&str> {
    let command = line.trim();
    if !command.starts_with(NAME_COMMAND_PREFIX) {
        return Err(SessionError::protocol(format!(
            "expected '/name <alias>', got {:?}",
            command
        )));
    }
    let tokens: Vec<&str> = command.split(' ').collect();
    if tokens.len() != 2 {
        return Err(SessionError::protocol(format!(
            "invalid name command {:?}",
            command
        )));
    }
    let alias = tokens[1];
    validate_alias(alias).map_err(|e| SessionError::protocol(e.to_string()))?;
    Ok(alias)
}

/// Read one line and derive the identity from the alias and the observed port.
///
/// At most `MAX_NAME_LINE_BYTES` are consumed; a longer line is a protocol error.
pub async fn read_remote_name<R>(reader: &mut R, observed_port: u16) -> Result<PeerIdentity>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = (&mut *reader)
        .take(MAX_NAME_LINE_BYTES as u64)
        .read_line(&mut line)
        .await
        .map_err(|e| SessionError::protocol(format!("failed to read name line: {}", e)))?;
    if n == MAX_NAME_LINE_BYTES && !line.ends_with('\n') {
        return Err(SessionError::protocol(format!(
            "name line exceeds {} bytes",
            MAX_NAME_LINE_BYTES
        )));
    }
    if n == 0 || !line.ends_with('\n') {
        return Err(SessionError::protocol(
            "stream closed before a full name line arrived",
        ));
    }
    let alias = parse_name_line(&line)?;
    Ok(PeerIdentity::new(alias, observed_port))
}

/// Run the symmetric exchange on an established connection.
///
/// Does not close the connection on failure; the caller closes it before
/// propagating the error.
pub async fn exchange_names(
    connection: &Connection,
    reader: &mut LineReader,
    local_alias: &str,
    role: Role,
) -> Result<PeerIdentity> {
    let remote = connection.remote_addr();
    connection.send_line(&name_line(local_alias)).await?;

    let identity = read_remote_name(reader, remote.port()).await?;
    emit_network_event(
        "handshake",
        LogLevel::Info,
        "handshake_success",
        Some(remote.to_string()),
        Some(format!(
            "peer={} role={:?}",
            identity,
            ConnectionRole::from(role)
        )),
    );
    Ok(identity)
}
