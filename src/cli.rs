use clap::Parser;

use crate::config::ServerConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "chftpd", about = "A read-only FTP server for a single directory tree.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Directory served as the sandbox root
    #[arg(short, long)]
    pub root: Option<String>,

    /// Address the control listener binds to
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Control port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line values override the configuration file.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(root) = &self.root {
            config.server_root = root.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.control_port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_config_values() {
        let cli = Cli::parse_from(["chftpd", "--root", "/srv/ftp", "--port", "2121"]);
        let mut config = ServerConfig::default();
        cli.apply(&mut config);

        assert_eq!(cli.config, "config.toml");
        assert_eq!(config.server_root, "/srv/ftp");
        assert_eq!(config.control_port, 2121);
        assert_eq!(config.bind_address, "127.0.0.1");
    }
}
