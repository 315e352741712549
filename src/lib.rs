//! chftpd
//!
//! A read-only FTP server exposing one sandboxed directory tree over
//! passive-mode data connections.

pub mod cli;
pub mod config;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;

pub use config::ServerConfig;
pub use server::{Server, ServerEvent};
