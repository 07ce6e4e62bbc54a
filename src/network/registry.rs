// src/network/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::{Result, SessionError};
use crate::network::connection::Connection;
use crate::network::identity::PeerIdentity;

/// What `add` does when the identity is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the existing session, refuse the new one.
    #[default]
    Reject,
    /// Install the new session and close the displaced connection.
    Replace,
}

/// Concurrency-safe map of live peer sessions.
///
/// Every method takes the single lock for its whole body and never awaits
/// while holding it; callers copy the `Arc<Connection>` out and do I/O after.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<Mutex<HashMap<PeerIdentity, Arc<Connection>>>>,
    policy: CollisionPolicy,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            peers: Arc::new(Mutex::new(HashMap::new())),
            policy,
        }
    }

    /// Register a handshaken session.
    ///
    /// Under `Reject` an existing entry wins and `Collision` is returned; the
    /// caller owns closing the new connection. Under `Replace` the previous
    /// connection is closed inside the same critical section.
    pub fn add(&self, identity: PeerIdentity, connection: Arc<Connection>) -> Result<()> {
        let mut peers = self.peers.lock();
        match self.policy {
            CollisionPolicy::Reject => {
                if peers.contains_key(&identity) {
                    return Err(SessionError::Collision(identity));
                }
                peers.insert(identity, connection);
            }
            CollisionPolicy::Replace => {
                if let Some(previous) = peers.insert(identity, connection) {
                    previous.close();
                }
            }
        }
        Ok(())
    }

    /// Remove a peer and close its connection atomically.
    pub fn remove(&self, identity: &PeerIdentity) -> Result<()> {
        let mut peers = self.peers.lock();
        match peers.remove(identity) {
            Some(conn) => {
                conn.close();
                Ok(())
            }
            None => Err(SessionError::NotFound(identity.to_string())),
        }
    }

    /// Remove the entry only if it still points at `connection`.
    /// Returns true when an entry was removed.
    pub fn remove_if_current(&self, identity: &PeerIdentity, connection: &Arc<Connection>) -> bool {
        let mut peers = self.peers.lock();
        let is_current = peers
            .get(identity)
            .map(|c| Arc::ptr_eq(c, connection))
            .unwrap_or(false);
        if is_current {
            if let Some(conn) = peers.remove(identity) {
                conn.close();
            }
        }
        is_current
    }

    pub fn lookup(&self, identity: &PeerIdentity) -> Option<Arc<Connection>> {
        self.peers.lock().get(identity).cloned()
    }

    pub fn contains(&self, identity: &PeerIdentity) -> bool {
        self.peers.lock().contains_key(identity)
    }

    /// Point-in-time key set, sorted for stable display.
    pub fn snapshot(&self) -> Vec<PeerIdentity> {
        let peers = self.peers.lock();
        let mut keys: Vec<PeerIdentity> = peers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Validate a whole receiver list against one consistent view of the registry.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PeerIdentity>> {
        let peers = self.peers.lock();
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let identity: PeerIdentity = name.parse()?;
            if !peers.contains_key(&identity) {
                return Err(SessionError::NotFound(name.to_string()));
            }
            out.push(identity);
        }
        Ok(out)
    }

    /// Drain every entry, closing each connection. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let mut peers = self.peers.lock();
        let count = peers.len();
        for (_, conn) in peers.drain() {
            conn.close();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }
}
