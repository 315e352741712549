//! Persisted root directory selection
//!
//! Keeps the id of the chosen sandbox root in a small TOML state file so the
//! server can restore it after a restart.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::StorageError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RootState {
    root_entry_id: Option<String>,
}

/// State-file backed store for the root directory id
#[derive(Debug)]
pub struct RootStore {
    state_file: PathBuf,
    cached: Option<String>,
}

impl RootStore {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            cached: None,
        }
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Returns the persisted root id, if one was saved.
    pub async fn root_entry_id(&mut self) -> Result<Option<String>, StorageError> {
        if self.cached.is_some() {
            return Ok(self.cached.clone());
        }

        let contents = match fs::read_to_string(&self.state_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state: RootState =
            toml::from_str(&contents).map_err(|e| StorageError::InvalidState(e.to_string()))?;
        self.cached = state.root_entry_id.filter(|id| !id.is_empty());
        Ok(self.cached.clone())
    }

    /// Persist `id` as the root. Saving the current id again is a no-op and
    /// `None` clears the selection.
    pub async fn set_root_entry_id(&mut self, id: Option<&str>) -> Result<(), StorageError> {
        let id = id.filter(|id| !id.is_empty());
        if id.is_some() && self.cached.as_deref() == id {
            debug!("Root id unchanged, nothing to persist");
            return Ok(());
        }

        match id {
            None => {
                self.cached = None;
                match fs::remove_file(&self.state_file).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                info!("Cleared persisted root directory");
            }
            Some(id) => {
                let state = RootState {
                    root_entry_id: Some(id.to_string()),
                };
                let contents = toml::to_string(&state)
                    .map_err(|e| StorageError::InvalidState(e.to_string()))?;
                fs::write(&self.state_file, contents).await?;
                self.cached = Some(id.to_string());
                info!(
                    "Persisted root directory {} to {}",
                    id,
                    self.state_file.display()
                );
            }
        }
        Ok(())
    }
}
