//! Source enumeration and workspace population.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::consts::IGNORED_SOURCE_DIRS;

/// List every source file under `root`, relative to `root`.
///
/// Dependency, build and output directories are skipped. Entries are sorted
/// by path so the same tree always yields the same list.
pub fn enumerate_sources(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    e.depth() == 0
      || e
        .file_name()
        .to_str()
        .map(|name| !IGNORED_SOURCE_DIRS.contains(&name))
        .unwrap_or(true)
  });

  let mut files = Vec::new();
  for entry in walker {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    files.push(relative.to_path_buf());
  }

  debug!(root = ?root, files = files.len(), "enumerated sources");
  Ok(files)
}

/// Copy `files` (relative to `from`) into the same layout under `to`.
pub async fn copy_sources(from: &Path, files: &[PathBuf], to: &Path) -> std::io::Result<()> {
  for file in files {
    let dest = to.join(file);
    if let Some(parent) = dest.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(from.join(file), &dest).await?;
  }
  debug!(from = ?from, to = ?to, files = files.len(), "copied sources into workspace");
  Ok(())
}
