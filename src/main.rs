//! chftpd - Entry Point

use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, error, info};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use chftpd::cli::Cli;
use chftpd::config::ServerConfig;
use chftpd::error::FtpServerError;
use chftpd::server::{Server, ServerEvent};
use chftpd::storage::LocalFileSystem;

#[tokio::main]
async fn main() -> Result<(), FtpServerError> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    info!("Launching FTP server...");

    let mut config = ServerConfig::load(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    let server = Server::bind(config, Arc::new(LocalFileSystem::new())).await?;

    let mut events = server.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ServerEvent::CommandArrived { peer, request }) => {
                    debug!("command-arrived from {}: {}", peer, request.trim_end());
                }
                Ok(event) => debug!("{:?}", event),
                Err(RecvError::Lagged(missed)) => debug!("Event observer missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Server stopped");
    Ok(())
}
