//! File system storage management
//!
//! The sandboxed file-system collaborator, the directory listing formatter
//! and the persisted root-directory selection.

pub mod filesystem;
pub mod listing;
pub mod root_store;

pub use filesystem::{Entry, FileReader, FileSystem, LocalFileSystem, Metadata};
pub use listing::{DirectoryEntry, format_listing};
pub use root_store::RootStore;
