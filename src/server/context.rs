//! Shared server state
//!
//! Everything a session needs from the server: configuration, the file
//! system, the sandbox root and the event sender.

use log::{info, warn};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::error::{FtpServerError, StorageError};
use crate::server::events::ServerEvent;
use crate::storage::{Entry, FileSystem, RootStore};

/// Read-only state shared by all sessions of one server
pub struct ServerContext {
    pub config: ServerConfig,
    pub fs: Arc<dyn FileSystem>,
    /// Sandbox root; no session can leave it
    pub root: Entry,
    events: broadcast::Sender<ServerEvent>,
}

impl ServerContext {
    pub fn new(
        config: ServerConfig,
        fs: Arc<dyn FileSystem>,
        root: Entry,
        events: broadcast::Sender<ServerEvent>,
    ) -> Self {
        Self {
            config,
            fs,
            root,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Publish an event; having no subscriber is fine.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}

/// Pick the sandbox root.
///
/// A configured `server_root` wins and is persisted as the new selection.
/// Without one, the previously persisted root is restored.
pub async fn select_root(
    config: &ServerConfig,
    fs: &dyn FileSystem,
) -> Result<Entry, FtpServerError> {
    let mut store = RootStore::new(config.state_file_path());

    let root = match config.server_root_path() {
        Some(path) => {
            if let Err(e) = tokio::fs::create_dir_all(&path).await {
                warn!("Failed to create server root directory: {}", e);
            }
            let canonical = tokio::fs::canonicalize(&path).await?;
            let root = fs.restore_entry(&canonical.to_string_lossy()).await?;

            if let Err(e) = store.set_root_entry_id(Some(&root.full_path)).await {
                warn!(
                    "Could not persist root selection to {}: {}",
                    store.state_file().display(),
                    e
                );
            }
            root
        }
        None => {
            let id = store
                .root_entry_id()
                .await?
                .ok_or(StorageError::NoRootSelected)?;
            fs.restore_entry(&id).await?
        }
    };

    info!("Server root directory: {}", root.full_path);
    Ok(root)
}
