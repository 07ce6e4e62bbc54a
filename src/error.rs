//! Error taxonomy for the peer session subsystem.

use crate::network::identity::PeerIdentity;

/// Errors surfaced by handshake, registry, routing and transport operations.
///
/// Each error is scoped to the single connection attempt or peer it names;
/// none of them is fatal to the node.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed or missing `/name <alias>` handshake line.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Operation referenced a peer identity that is not registered.
    #[error("no peer found with name {0}")]
    NotFound(String),

    /// A freshly handshaken peer produced an identity that is already registered.
    #[error("peer {0} is already connected")]
    Collision(PeerIdentity),

    /// Dial target is this node's own listening address.
    #[error("cannot connect to self ({0})")]
    SelfConnect(String),

    /// Accept, dial, read or write failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Invalid local configuration (alias, listen address, policy names).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        SessionError::Protocol(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
