//! Control-connection sessions
//!
//! Per-connection state, the sequential command loop and the registry of
//! live sessions used to enforce the client limit.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_session;
pub use registry::SessionRegistry;
pub use state::Session;
