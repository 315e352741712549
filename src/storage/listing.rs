//! Directory listing formatter
//!
//! Renders directory entries in the fixed-column `ls -l` style that FTP
//! clients expect from `LIST`. Permissions, owner, group and timestamps are
//! static; only the type flag, size and name vary.

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    /// `None` for directories
    pub size_in_bytes: Option<u64>,
}

const MIN_SIZE_WIDTH: usize = 4;
const PERMISSIONS: &str = "rwxr-xr-x";
const TIMESTAMP: &str = "Jan 01 00:00";

/// Format entries into a listing, one `\r\n`-terminated line per entry.
pub fn format_listing(entries: &[DirectoryEntry]) -> String {
    let width = size_width(entries);
    entries
        .iter()
        .map(|entry| format_line(entry, width) + "\r\n")
        .collect()
}

fn size_width(entries: &[DirectoryEntry]) -> usize {
    let largest = entries
        .iter()
        .filter_map(|e| e.size_in_bytes)
        .max()
        .unwrap_or(0);
    largest.to_string().len().max(MIN_SIZE_WIDTH)
}

fn format_line(entry: &DirectoryEntry, width: usize) -> String {
    let kind = if entry.is_directory { 'd' } else { '-' };
    let size = entry.size_in_bytes.unwrap_or(0);
    format!(
        "{kind}{PERMISSIONS} 1 0 0 {size:>width$} {TIMESTAMP} {}",
        entry.name
    )
}
