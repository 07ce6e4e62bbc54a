// src/network/identity.rs

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Registry key for a connected peer: `<alias>:<port>`.
///
/// The port is always the one observed on the socket, never one claimed by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerIdentity(String);

impl PeerIdentity {
    pub fn new(alias: &str, port: u16) -> Self {
        Self(format!("{}:{}", alias, port))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Alias portion (everything before the last `:`).
    pub fn alias(&self) -> &str {
        self.0
            .rsplit_once(':')
            .map(|(alias, _)| alias)
            .unwrap_or(&self.0)
    }

    /// Port portion, if it parses.
    pub fn port(&self) -> Option<u16> {
        self.0
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }

    /// Display form used by the host: `alias(port)`.
    pub fn display(&self) -> String {
        match self.port() {
            Some(port) => format!("{}({})", self.alias(), port),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerIdentity {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once(':') {
            Some((alias, port)) if validate_alias(alias).is_ok() && port.parse::<u16>().is_ok() => {
                Ok(Self(s.to_string()))
            }
            _ => Err(SessionError::NotFound(s.to_string())),
        }
    }
}

impl AsRef<str> for PeerIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Aliases travel as a single space-delimited token, so they must be non-empty
/// and free of whitespace.
pub fn validate_alias(alias: &str) -> Result<(), SessionError> {
    if alias.is_empty() {
        return Err(SessionError::Config("name cannot be empty".into()));
    }
    if alias.chars().any(char::is_whitespace) {
        return Err(SessionError::Config(format!(
            "name '{}' must not contain whitespace",
            alias
        )));
    }
    Ok(())
}
