//! Server events
//!
//! Observers subscribe through `Server::subscribe`. Publishing never blocks
//! the sessions; a lagging observer loses the oldest events.

use std::net::SocketAddr;

/// Capacity of the broadcast channel behind `Server::subscribe`
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ClientConnected(SocketAddr),
    /// A control line arrived, before it is parsed or handled
    CommandArrived {
        peer: SocketAddr,
        request: String,
    },
    ClientDisconnected(SocketAddr),
}
