//! Live session registry
//!
//! Bookkeeping of connected control clients, used to refuse connections
//! beyond the configured limit.

use log::{info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Connected clients keyed by peer address
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SocketAddr, Instant>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `addr` unless `max_clients` sessions are already live.
    pub fn try_register(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.sessions.len() >= max_clients {
            warn!(
                "Rejecting {}: {} of {} client slots in use",
                addr,
                self.sessions.len(),
                max_clients
            );
            return false;
        }

        self.sessions.insert(addr, Instant::now());
        info!("Client {} registered ({} active)", addr, self.sessions.len());
        true
    }

    pub fn remove(&mut self, addr: &SocketAddr) {
        if let Some(connected_at) = self.sessions.remove(addr) {
            info!(
                "Client {} removed after {:?} ({} active)",
                addr,
                connected_at.elapsed(),
                self.sessions.len()
            );
        }
    }
}
