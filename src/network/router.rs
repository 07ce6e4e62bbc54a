// src/network/router.rs

use crate::events::model::LogLevel;
use crate::network::events::emit_network_event;
use crate::network::identity::PeerIdentity;
use crate::network::registry::PeerRegistry;

/// Outcome of one fan-out, in receiver order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReport {
    pub delivered: Vec<PeerIdentity>,
    /// Receivers that were not registered at lookup time.
    pub missing: Vec<PeerIdentity>,
    /// Receivers whose write failed, with the error text.
    pub failed: Vec<(PeerIdentity, String)>,
}

impl RouteReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }

    /// Human-readable notices for everything that was not delivered.
    pub fn notices(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .missing
            .iter()
            .map(|id| format!("No peer found with name {}", id))
            .collect();
        out.extend(
            self.failed
                .iter()
                .map(|(id, err)| format!("Error sending message to {}: {}", id, err)),
        );
        out
    }
}

/// Best-effort delivery of locally authored lines to directly connected peers.
#[derive(Clone)]
pub struct MessageRouter {
    registry: PeerRegistry,
}

impl MessageRouter {
    pub fn new(registry: PeerRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `message` to each receiver in order. Unknown receivers and
    /// failed writes are recorded and skipped; they never abort the fan-out.
    pub async fn route(&self, message: &str, receivers: &[PeerIdentity]) -> RouteReport {
        let mut report = RouteReport::default();
        for identity in receivers {
            // Copy the connection out; the write happens with the registry unlocked.
            let Some(conn) = self.registry.lookup(identity) else {
                emit_network_event(
                    "router",
                    LogLevel::Warn,
                    "route_peer_not_found",
                    None,
                    Some(format!("peer={}", identity)),
                );
                report.missing.push(identity.clone());
                continue;
            };
            match conn.send_line(message).await {
                Ok(()) => report.delivered.push(identity.clone()),
                Err(e) => {
                    emit_network_event(
                        "router",
                        LogLevel::Error,
                        "route_write_failed",
                        Some(conn.remote_addr().to_string()),
                        Some(format!("peer={} err={}", identity, e)),
                    );
                    report.failed.push((identity.clone(), e.to_string()));
                }
            }
        }
        report
    }
}
