//! Configuration management for chftpd
//!
//! Loads the server-wide configuration from an optional TOML file layered
//! under `CHFTPD__*` environment variables. The resulting `ServerConfig` is
//! passed explicitly into the server and threaded through every command
//! dispatch; nothing here is global.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default chunk size for RETR streaming (100 KiB).
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 1024 * 100;

/// Default welcome banner sent with the `220` greeting.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to chftpd.";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address the control listener binds to. PASV listeners reuse the
    /// address the control connection was accepted on.
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Sandbox root on the host. Empty means "restore the persisted root".
    pub server_root: String,

    /// File holding the persisted root id between restarts
    pub state_file: String,

    /// Maximum concurrent control connections
    pub max_clients: usize,

    /// Maximum accepted length of one control line, terminator included
    pub max_command_length: usize,

    /// Chunk size used when streaming files over the data channel
    pub stream_buffer_size: usize,

    /// How long LIST/RETR wait for the passive client to connect
    pub data_connection_timeout_secs: u64,

    /// Gate directory, listing and transfer commands behind a completed login
    pub require_login: bool,

    pub welcome_message: String,

    pub auth: AuthConfig,
}

/// Credentials and login banners
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub allow_anonymous_login: bool,
    pub username: String,
    pub password: String,
    pub login_message: LoginMessage,
}

/// Message shown after a successful login, either one line or several.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum LoginMessage {
    Single(String),
    Lines(Vec<String>),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 21,
            server_root: String::new(),
            state_file: ".chftpd-state.toml".to_string(),
            max_clients: 10,
            max_command_length: 512,
            stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
            data_connection_timeout_secs: 30,
            require_login: true,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_anonymous_login: true,
            username: "anonymous".to_string(),
            password: String::new(),
            login_message: LoginMessage::default(),
        }
    }
}

impl Default for LoginMessage {
    fn default() -> Self {
        LoginMessage::Lines(Vec::new())
    }
}

impl LoginMessage {
    /// Returns the banner lines, skipping empty ones.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            LoginMessage::Single(line) => std::iter::once(line.as_str())
                .filter(|l| !l.is_empty())
                .collect(),
            LoginMessage::Lines(lines) => lines
                .iter()
                .map(String::as_str)
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the given TOML file (optional) with
    /// `CHFTPD__` environment overrides, then validate it.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CHFTPD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.stream_buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "stream_buffer_size must be greater than 0".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_command_length < 8 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 8".into(),
            ));
        }

        if !self.auth.allow_anonymous_login && self.auth.username.is_empty() {
            return Err(config::ConfigError::Message(
                "auth.username is required when anonymous login is disabled".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Configured sandbox root, if any
    pub fn server_root_path(&self) -> Option<PathBuf> {
        if self.server_root.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.server_root))
        }
    }

    pub fn state_file_path(&self) -> PathBuf {
        PathBuf::from(&self.state_file)
    }

    /// Get data connection timeout as Duration
    pub fn data_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.data_connection_timeout_secs)
    }

    /// Greeting line sent when a control connection is accepted.
    pub fn greeting(&self) -> String {
        let hint = if self.auth.allow_anonymous_login {
            " Anonymous login allowed; please send email as password."
        } else {
            ""
        };
        format!("220 {}{}\r\n", self.welcome_message, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream_buffer_size, 102_400);
        assert!(config.auth.allow_anonymous_login);
    }

    #[test]
    fn greeting_mentions_anonymous_login_only_when_enabled() {
        let mut config = ServerConfig::default();
        assert_eq!(
            config.greeting(),
            "220 Welcome to chftpd. Anonymous login allowed; please send email as password.\r\n"
        );

        config.auth.allow_anonymous_login = false;
        assert_eq!(config.greeting(), "220 Welcome to chftpd.\r\n");
    }

    #[test]
    fn rejects_zero_buffer() {
        let config = ServerConfig {
            stream_buffer_size: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn named_login_requires_username() {
        let mut config = ServerConfig::default();
        config.auth.allow_anonymous_login = false;
        config.auth.username.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn login_message_lines() {
        assert_eq!(LoginMessage::Single(";-)".into()).lines(), vec![";-)"]);
        assert!(LoginMessage::Single(String::new()).lines().is_empty());
        assert_eq!(
            LoginMessage::Lines(vec!["one".into(), "".into(), "two".into()]).lines(),
            vec!["one", "two"]
        );
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chftpd.toml");
        std::fs::write(
            &path,
            "control_port = 2121\nstream_buffer_size = 4096\n\n[auth]\nallow_anonymous_login = false\nusername = \"alice\"\npassword = \"secret\"\nlogin_message = \"hello\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.control_port, 2121);
        assert_eq!(config.stream_buffer_size, 4096);
        assert_eq!(config.max_clients, 10);
        assert!(!config.auth.allow_anonymous_login);
        assert_eq!(config.auth.username, "alice");
        assert_eq!(config.auth.login_message.lines(), vec!["hello"]);
    }
}
