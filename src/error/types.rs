//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.
//! None of them is fatal to a control connection; they surface as replies.

use std::io;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// Path resolution errors
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error("Directory not found: {0}")]
    NotFound(String),

    #[error("the root path \"{root}\" does not contain the requested path \"{requested}\"")]
    OutsideRoot { root: String, requested: String },
}

/// File system collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("No root directory selected")]
    NoRootSelected,

    #[error("Invalid root state file: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Data channel errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to bind passive listener on {0}: {1}")]
    PortBindingFailed(SocketAddr, io::Error),

    #[error("Passive mode needs an IPv4 control address, got {0}")]
    UnsupportedAddress(IpAddr),

    #[error("Timeout waiting for the passive data connection on port {0}")]
    ConnectionTimeout(u16),

    #[error("Passive data connection already consumed")]
    AlreadyConsumed,

    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] io::Error),
}

/// Control channel protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("\"{0}\" is not valid.")]
    InvalidCommand(String),

    #[error("\"{0}\" is not implemented.")]
    NotImplemented(String),
}

/// General FTP server error that encompasses all error types
#[derive(Debug, Error)]
pub enum FtpServerError {
    #[error("Navigate error: {0}")]
    Navigate(#[from] NavigateError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}
