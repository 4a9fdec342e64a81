//! Path helpers for output keys.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Extension-less key to on-disk path, rejecting anything that could escape
/// the directory it is joined onto.
///
/// Keys use `/` as separator regardless of platform. Returns `None` for empty
/// keys, absolute keys and keys containing `.` or `..` segments.
pub fn relative_key_path(key: &str) -> Option<PathBuf> {
  if key.is_empty() || key.starts_with('/') || key.contains('\\') {
    return None;
  }

  let mut path = PathBuf::new();
  for segment in key.split('/') {
    if segment.is_empty() {
      return None;
    }
    match Path::new(segment).components().next() {
      Some(Component::Normal(_)) => path.push(segment),
      _ => return None,
    }
  }
  Some(path)
}

/// Path with `.partial` appended to the file name, used while writing.
pub fn partial_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".");
  name.push(crate::consts::PARTIAL_EXTENSION);
  path.with_file_name(name)
}

/// Remove a leftover partial file after a failed write. A missing file is not
/// an error.
pub async fn discard_partial(partial: &Path) {
  match tokio::fs::remove_file(partial).await {
    Ok(()) => debug!(path = ?partial, "removed partial file"),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
    Err(e) => warn!(path = ?partial, error = %e, "failed to remove partial file"),
  }
}
