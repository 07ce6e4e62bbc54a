pub mod connection;
pub(crate) mod events;
pub mod handshake;
pub mod identity;
pub mod listener;
pub mod registry;
pub mod router;
pub mod session;
pub mod transport;

pub use connection::Connection;
pub use handshake::Role;
pub use identity::PeerIdentity;
pub use listener::{bind_listener, run_acceptor};
pub use registry::{CollisionPolicy, PeerRegistry};
pub use router::{MessageRouter, RouteReport};
pub use session::{DisconnectReason, SessionContext, SessionEvent};
pub use transport::connect_to_peer;
