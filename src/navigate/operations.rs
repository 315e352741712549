//! Navigation operations implementation

use log::debug;

use crate::error::{FtpServerError, NavigateError, StorageError};
use crate::storage::{Entry, FileSystem};

/// Normalize `client_path` against `current` into absolute host-path
/// segments, applying `..` and checking the sandbox after every step.
///
/// Pure string arithmetic: nothing is looked up in the file system.
pub fn normalize_path(
    root: &Entry,
    current: &Entry,
    client_path: &str,
) -> Result<Vec<String>, NavigateError> {
    if client_path.is_empty() {
        return Err(NavigateError::NotFound(client_path.to_string()));
    }

    let base = if client_path.starts_with('/') { root } else { current };
    let root_segments = root.segments();
    let mut segments: Vec<String> = base.segments().iter().map(|s| s.to_string()).collect();

    for segment in client_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
                if !within_root(&root_segments, &segments) {
                    return Err(NavigateError::OutsideRoot {
                        root: join_absolute(&root_segments),
                        requested: join_absolute(&segments),
                    });
                }
            }
            name => segments.push(name.to_string()),
        }
    }

    if !within_root(&root_segments, &segments) {
        return Err(NavigateError::OutsideRoot {
            root: join_absolute(&root_segments),
            requested: join_absolute(&segments),
        });
    }

    Ok(segments)
}

fn within_root<S: AsRef<str>>(root: &[&str], path: &[S]) -> bool {
    path.len() >= root.len() && root.iter().zip(path).all(|(r, p)| *r == p.as_ref())
}

/// Absolute path ending in `/`
fn join_absolute<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::from("/");
    for segment in segments {
        path.push_str(segment.as_ref());
        path.push('/');
    }
    path
}

/// Resolve `client_path` to a directory inside the sandbox.
pub async fn resolve_directory(
    fs: &dyn FileSystem,
    root: &Entry,
    current: &Entry,
    client_path: &str,
) -> Result<Entry, FtpServerError> {
    let segments = normalize_path(root, current, client_path)?;
    let relative = &segments[root.segments().len()..];

    let mut entry = root.clone();
    for name in relative {
        entry = find_child(fs, &entry, name, true)
            .await?
            .ok_or_else(|| NavigateError::NotFound(client_path.to_string()))?;
    }

    debug!("Resolved {:?} to {}", client_path, entry.full_path);
    Ok(entry)
}

/// Resolve `client_path` to a regular file inside the sandbox.
pub async fn resolve_file(
    fs: &dyn FileSystem,
    root: &Entry,
    current: &Entry,
    client_path: &str,
) -> Result<Entry, FtpServerError> {
    let trimmed = client_path.trim_end_matches('/');
    let (dir_part, file_name) = match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(index) => (&trimmed[..index], &trimmed[index + 1..]),
        None => (".", trimmed),
    };

    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(StorageError::NotAFile(client_path.to_string()).into());
    }

    let dir = resolve_directory(fs, root, current, dir_part).await?;
    find_child(fs, &dir, file_name, false)
        .await?
        .ok_or_else(|| StorageError::NotFound(client_path.to_string()).into())
}

async fn find_child(
    fs: &dyn FileSystem,
    dir: &Entry,
    name: &str,
    is_directory: bool,
) -> Result<Option<Entry>, FtpServerError> {
    let entries = fs.list_directory_entries(dir).await?;
    Ok(entries
        .into_iter()
        .find(|e| e.is_directory == is_directory && e.name == name))
}

/// Changes the working directory: resolves `target_path` from `current`.
pub async fn change_directory(
    fs: &dyn FileSystem,
    root: &Entry,
    current: &Entry,
    target_path: &str,
) -> Result<Entry, FtpServerError> {
    resolve_directory(fs, root, current, target_path).await
}

/// Client-visible path of `entry`: its full path minus the root prefix,
/// `/` for the root itself.
pub fn display_path(root: &Entry, entry: &Entry) -> String {
    let root_segments = root.segments();
    let segments = entry.segments();
    if !within_root(&root_segments, &segments) {
        return "/".to_string();
    }

    let relative = &segments[root_segments.len()..];
    if relative.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", relative.join("/"))
    }
}

/// Escape a path for a `257` reply: `"` doubles, LF becomes NUL.
pub fn quote_path(path: &str) -> String {
    path.replace('"', "\"\"").replace('\n', "\0")
}
