//! Session state management
//!
//! Tracks login progress, the working directory, the transfer type and the
//! pending passive data channel of one control connection.

use log::debug;
use std::net::SocketAddr;
use std::time::Instant;

use crate::storage::Entry;
use crate::transfer::{PassiveDataChannel, TransferType};

/// State of a single control connection
#[derive(Debug)]
pub struct Session {
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    username: Option<String>,
    authenticated: bool,
    anonymous: bool,
    /// What an anonymous user sent as password, usually an email address
    anonymous_password: Option<String>,
    current_directory: Entry,
    last_command_verb: Option<String>,
    transfer_type: TransferType,
    data_channel: Option<PassiveDataChannel>,
    accepted_at: Instant,
    last_request_at: Option<Instant>,
}

impl Session {
    /// A fresh session starts unauthenticated at the sandbox root in binary mode.
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr, root: Entry) -> Self {
        Self {
            peer_addr,
            local_addr,
            username: None,
            authenticated: false,
            anonymous: false,
            anonymous_password: None,
            current_directory: root,
            last_command_verb: None,
            transfer_type: TransferType::default(),
            data_channel: None,
            accepted_at: Instant::now(),
            last_request_at: None,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Address the control connection was accepted on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn anonymous_password(&self) -> Option<&str> {
        self.anonymous_password.as_deref()
    }

    /// Complete an anonymous login; `password` is kept for the logs.
    pub fn login_anonymous(&mut self, password: &str) {
        self.anonymous = true;
        self.anonymous_password = Some(password.to_string());
        self.authenticated = true;
    }

    /// Complete a named login
    pub fn login(&mut self) {
        self.anonymous = false;
        self.anonymous_password = None;
        self.authenticated = true;
    }

    pub fn current_directory(&self) -> &Entry {
        &self.current_directory
    }

    pub fn set_current_directory(&mut self, dir: Entry) {
        self.current_directory = dir;
    }

    /// Verb of the last command whose handler returned normally
    pub fn last_command_verb(&self) -> Option<&str> {
        self.last_command_verb.as_deref()
    }

    pub fn set_last_command_verb(&mut self, verb: &str) {
        self.last_command_verb = Some(verb.to_string());
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn set_transfer_type(&mut self, transfer_type: TransferType) {
        self.transfer_type = transfer_type;
    }

    /// Install a new passive channel, closing the previous one if any.
    pub fn set_data_channel(&mut self, channel: PassiveDataChannel) {
        if let Some(previous) = self.data_channel.replace(channel) {
            debug!(
                "Client {} replaced pending passive channel on port {}",
                self.peer_addr,
                previous.port()
            );
        }
    }

    /// Take the pending passive channel; a channel serves one transfer.
    pub fn take_data_channel(&mut self) -> Option<PassiveDataChannel> {
        self.data_channel.take()
    }

    pub fn has_data_channel(&self) -> bool {
        self.data_channel.is_some()
    }

    pub fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    pub fn last_request_at(&self) -> Option<Instant> {
        self.last_request_at
    }

    /// Record that a request just arrived.
    pub fn touch(&mut self) {
        self.last_request_at = Some(Instant::now());
    }
}
