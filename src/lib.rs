//! # PeerChat
//!
//! Serverless text chat over plain TCP. Every node listens for inbound peers
//! and dials outbound ones; there is no central server and each node keeps its
//! own view of who is connected.
//!
//! ## Wire protocol
//! Newline-terminated UTF-8 text. The first line in each direction is
//! `/name <alias>`; every later line is an opaque chat message. A peer is
//! known locally as `<alias>:<observed remote port>`.
//!
//! ## Key Modules
//! * `network`: Handshake, peer registry, receive loops, routing, listener and dialer.
//! * `node`: `ChatNode`, the four operations the command layer drives.
//! * `events`: Structured logging/events dispatcher (console + JSON lines).
//! * `config`: TOML runtime configuration.
//! * `prompt`: Interactive command interpreter.
//!
//! ## Non-goals
//! No encryption, no persistence of peers across restarts, no multi-hop
//! routing, no delivery guarantees beyond TCP ordering on a single connection.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod network;
pub mod node;
pub mod prompt;

pub use error::{Result, SessionError};
pub use network::{PeerIdentity, PeerRegistry, RouteReport, SessionEvent};
pub use node::{ChatNode, NodeOptions};
