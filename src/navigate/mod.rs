//! Navigate module
//!
//! Resolves client-supplied paths against the sandbox root and renders the
//! client-visible working directory.

mod operations;

pub use operations::{
    change_directory, display_path, normalize_path, quote_path, resolve_directory, resolve_file,
};
