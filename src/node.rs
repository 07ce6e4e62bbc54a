// src/node.rs

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_LISTEN_ADDR};
use crate::error::Result;
use crate::events::model::LogLevel;
use crate::network::events::emit_system_event;
use crate::network::identity::{validate_alias, PeerIdentity};
use crate::network::listener::{bind_listener, run_acceptor};
use crate::network::registry::{CollisionPolicy, PeerRegistry};
use crate::network::router::{MessageRouter, RouteReport};
use crate::network::session::{SessionContext, SessionEvent};
use crate::network::transport::connect_to_peer;

/// Parameters for starting a node.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    pub alias: String,
    pub listen_addr: String,
    pub collision: CollisionPolicy,
    pub event_capacity: usize,
}

impl NodeOptions {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            collision: CollisionPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// Fill listen address and session settings from config; `alias` is resolved by the caller.
    pub fn from_config(alias: impl Into<String>, config: &Config) -> Self {
        let session = config.session.clone().unwrap_or_default();
        Self {
            alias: alias.into(),
            listen_addr: config
                .listen_addr
                .clone()
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            collision: session.collision.unwrap_or_default(),
            event_capacity: session
                .event_capacity
                .unwrap_or(DEFAULT_EVENT_CAPACITY)
                .max(1),
        }
    }
}

/// A running chat node: one listener, many peer sessions.
///
/// Exposes the four operations the command layer drives: `dial`,
/// `disconnect`, `current_peer_names` and `route`.
pub struct ChatNode {
    ctx: SessionContext,
    router: MessageRouter,
    listen_addr: SocketAddr,
    acceptor: JoinHandle<()>,
}

impl ChatNode {
    /// Bind the listener and start accepting. Session events for the host
    /// arrive on the returned receiver.
    pub async fn start(options: NodeOptions) -> Result<(ChatNode, mpsc::Receiver<SessionEvent>)> {
        validate_alias(&options.alias)?;
        let listener = bind_listener(&options.listen_addr).await?;
        let listen_addr = listener.local_addr()?;

        let registry = PeerRegistry::with_policy(options.collision);
        let (tx, rx) = mpsc::channel(options.event_capacity);
        let ctx = SessionContext::new(options.alias.as_str(), registry.clone(), tx);
        let acceptor = tokio::spawn(run_acceptor(listener, ctx.clone()));

        emit_system_event(
            "node",
            LogLevel::Info,
            "node_started",
            Some(format!(
                "alias={} listen={} collision={:?}",
                options.alias, listen_addr, options.collision
            )),
        );
        let node = ChatNode {
            ctx,
            router: MessageRouter::new(registry),
            listen_addr,
            acceptor,
        };
        Ok((node, rx))
    }

    pub fn alias(&self) -> &str {
        &self.ctx.local_alias
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.ctx.registry
    }

    /// Dial `address` and complete the handshake in the initiating role.
    pub async fn dial(&self, address: &str) -> Result<PeerIdentity> {
        connect_to_peer(address, self.listen_addr, &self.ctx).await
    }

    /// Close and forget a peer.
    pub fn disconnect(&self, identity: &PeerIdentity) -> Result<()> {
        self.ctx.registry.remove(identity)?;
        emit_system_event(
            "node",
            LogLevel::Info,
            "peer_disconnect_requested",
            Some(format!("peer={}", identity)),
        );
        Ok(())
    }

    pub fn current_peer_names(&self) -> Vec<PeerIdentity> {
        self.ctx.registry.snapshot()
    }

    /// Validate a receiver list in one step; fails on the first unknown name.
    pub fn resolve_receivers<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PeerIdentity>> {
        self.ctx.registry.resolve_all(names)
    }

    pub async fn route(&self, message: &str, receivers: &[PeerIdentity]) -> RouteReport {
        self.router.route(message, receivers).await
    }

    /// Stop accepting and close every session. Returns how many were closed.
    pub fn shutdown(&self) -> usize {
        self.acceptor.abort();
        let closed = self.ctx.registry.close_all();
        emit_system_event(
            "node",
            LogLevel::Info,
            "node_shutdown",
            Some(format!("closed_peers={}", closed)),
        );
        closed
    }
}

impl Drop for ChatNode {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}
