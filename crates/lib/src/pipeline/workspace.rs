//! Build workspace lifecycle.
//!
//! A [`Workspace`] is either a fresh temporary directory or the caller's own
//! directory. Temporary workspaces are released when the guard drops, on every
//! exit path of the pipeline: erased if cleanup was requested, kept on disk
//! otherwise. A caller-provided directory is never touched.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::consts::WORKSPACE_PREFIX;

#[derive(Debug)]
pub struct Workspace {
  root: PathBuf,
  temp: Option<TempDir>,
  erase_on_drop: bool,
}

impl Workspace {
  /// Create a fresh temporary workspace.
  ///
  /// With `erase_on_drop` unset the directory survives the run, so the build
  /// cache can be inspected or reused.
  pub fn temporary(erase_on_drop: bool) -> io::Result<Self> {
    let temp = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
    let root = temp.path().to_path_buf();
    debug!(path = ?root, "created temporary workspace");
    Ok(Self {
      root,
      temp: Some(temp),
      erase_on_drop,
    })
  }

  /// Use an existing directory owned by the caller.
  pub fn local(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      temp: None,
      erase_on_drop: false,
    }
  }

  pub fn path(&self) -> &Path {
    &self.root
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    let Some(temp) = self.temp.take() else {
      return;
    };

    if self.erase_on_drop {
      match temp.close() {
        Ok(()) => debug!(path = ?self.root, "erased temporary workspace"),
        Err(e) => warn!(path = ?self.root, error = %e, "failed to erase temporary workspace"),
      }
    } else {
      let kept = temp.keep();
      info!(path = ?kept, "keeping build workspace");
    }
  }
}
