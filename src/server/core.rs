use log::{error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::error::FtpServerError;
use crate::protocol::responses::TOO_MANY_CONNECTIONS;
use crate::server::context::{ServerContext, select_root};
use crate::server::events::{EVENT_CHANNEL_CAPACITY, ServerEvent};
use crate::session::{SessionRegistry, handle_session};
use crate::storage::FileSystem;

pub struct Server {
    session_registry: Arc<Mutex<SessionRegistry>>,
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Select the sandbox root and bind the control listener.
    pub async fn bind(
        config: ServerConfig,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, FtpServerError> {
        let root = select_root(&config, fs.as_ref()).await?;

        let control_socket = config.control_socket();
        let listener = match TcpListener::bind(&control_socket).await {
            Ok(listener) => {
                info!("Server bound to {}", control_socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", control_socket, e);
                return Err(e.into());
            }
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            session_registry: Arc::new(Mutex::new(SessionRegistry::new())),
            listener,
            context: Arc::new(ServerContext::new(config, fs, root, events)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Receive connection and command events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.context.subscribe()
    }

    /// Accept clients until `shutdown` resolves, then close every session.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting chftpd on {} (max {} clients)",
            self.context.config.control_socket(),
            self.context.config.max_clients
        );

        tokio::pin!(shutdown);
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down, closing {} sessions", sessions.len());
                    break;
                }
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let session_registry = Arc::clone(&self.session_registry);
                        let context = Arc::clone(&self.context);

                        // Spawn a task for each client so accept loop doesn't block
                        sessions.spawn(async move {
                            if let Err(e) =
                                handle_new_client(stream, addr, session_registry, context).await
                            {
                                warn!("Failed to handle client {}: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
            }
        }

        sessions.shutdown().await;
    }
}

/// Registers the client, or refuses it with `421` when the server is full,
/// then runs its session.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    session_registry: Arc<Mutex<SessionRegistry>>,
    context: Arc<ServerContext>,
) -> Result<(), std::io::Error> {
    let registered = session_registry
        .lock()
        .await
        .try_register(client_addr, context.config.max_clients);

    if !registered {
        stream.write_all(TOO_MANY_CONNECTIONS.as_bytes()).await?;
        stream.flush().await?;
        return Ok(());
    }

    context.publish(ServerEvent::ClientConnected(client_addr));
    let result = handle_session(stream, client_addr, Arc::clone(&context)).await;

    session_registry.lock().await.remove(&client_addr);
    context.publish(ServerEvent::ClientDisconnected(client_addr));
    result
}
