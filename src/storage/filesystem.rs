//! File system collaborator
//!
//! `FileSystem` is the boundary between the protocol engine and the host's
//! storage. Handles are plain `Entry` values carrying the host path; the
//! engine never touches `std::fs` directly.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncRead;

use crate::error::StorageError;

/// Readable stream returned by `open_file_for_read`.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opaque reference to a file or directory inside the host file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Absolute, `/`-separated host path without a trailing slash (`/` for
    /// the file-system root).
    pub full_path: String,
    pub is_directory: bool,
}

/// Per-entry metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub size_in_bytes: u64,
}

impl Entry {
    pub fn directory(full_path: &str) -> Self {
        Self::new(full_path, true)
    }

    pub fn file(full_path: &str) -> Self {
        Self::new(full_path, false)
    }

    fn new(full_path: &str, is_directory: bool) -> Self {
        let trimmed = full_path.trim_end_matches('/');
        let full_path = if trimmed.is_empty() { "/" } else { trimmed };
        let name = full_path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            name,
            full_path: full_path.to_string(),
            is_directory,
        }
    }

    /// Host path of this entry
    pub fn host_path(&self) -> PathBuf {
        PathBuf::from(&self.full_path)
    }

    /// Path segments of `full_path`
    pub fn segments(&self) -> Vec<&str> {
        self.full_path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Storage operations consumed by the command handlers.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Turn a persisted root id back into a directory handle.
    async fn restore_entry(&self, id: &str) -> Result<Entry, StorageError>;

    /// Direct children of `dir`.
    async fn list_directory_entries(&self, dir: &Entry) -> Result<Vec<Entry>, StorageError>;

    async fn metadata(&self, entry: &Entry) -> Result<Metadata, StorageError>;

    /// Parent directory, `None` at the file-system root.
    async fn parent(&self, entry: &Entry) -> Result<Option<Entry>, StorageError>;

    async fn open_file_for_read(&self, entry: &Entry) -> Result<FileReader, StorageError>;
}

/// `FileSystem` backed by the local disk through `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn restore_entry(&self, id: &str) -> Result<Entry, StorageError> {
        let path = fs::canonicalize(id)
            .await
            .map_err(|_| StorageError::NotFound(id.to_string()))?;
        let metadata = fs::metadata(&path).await?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(id.to_string()));
        }
        Ok(Entry::directory(&path_to_string(&path)))
    }

    async fn list_directory_entries(&self, dir: &Entry) -> Result<Vec<Entry>, StorageError> {
        if !dir.is_directory {
            return Err(StorageError::NotADirectory(dir.full_path.clone()));
        }

        let mut reader = fs::read_dir(dir.host_path()).await?;
        let mut entries = Vec::new();
        while let Some(child) = reader.next_entry().await? {
            let file_type = child.file_type().await?;
            if file_type.is_symlink() {
                // A link could point outside the sandbox.
                debug!("Skipping symlink {}", child.path().display());
                continue;
            }
            let full_path = path_to_string(&child.path());
            entries.push(if file_type.is_dir() {
                Entry::directory(&full_path)
            } else {
                Entry::file(&full_path)
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn metadata(&self, entry: &Entry) -> Result<Metadata, StorageError> {
        let metadata = fs::symlink_metadata(entry.host_path()).await?;
        Ok(Metadata {
            size_in_bytes: if metadata.is_dir() { 0 } else { metadata.len() },
        })
    }

    async fn parent(&self, entry: &Entry) -> Result<Option<Entry>, StorageError> {
        Ok(entry
            .host_path()
            .parent()
            .map(|parent| Entry::directory(&path_to_string(parent))))
    }

    async fn open_file_for_read(&self, entry: &Entry) -> Result<FileReader, StorageError> {
        if entry.is_directory {
            return Err(StorageError::NotAFile(entry.full_path.clone()));
        }
        let file = fs::File::open(entry.host_path()).await?;
        Ok(Box::new(file))
    }
}
