//! Server core functionality
//!
//! This module contains the accept loop, the state shared by every session
//! and the events the server publishes to observers.

pub mod context;
pub mod core;
pub mod events;

pub use context::{ServerContext, select_root};
pub use core::Server;
pub use events::ServerEvent;
