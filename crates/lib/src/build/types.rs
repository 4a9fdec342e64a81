use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::output::BuildResult;

/// Errors reported by a framework build.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The entry point is not among the source files.
  #[error("entrypoint {0} not found in source files")]
  MissingEntrypoint(String),

  /// Build command exited unsuccessfully.
  #[error("build command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The build document is missing or malformed.
  #[error("invalid build output {path}: {message}")]
  InvalidOutput { path: PathBuf, message: String },

  /// A file referenced by the build document could not be loaded.
  #[error("failed to load {path}: {source}")]
  LoadArtifact {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// I/O error while running the build.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Inputs handed to the framework build.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
  /// Source files, relative to `work_path`.
  pub files: &'a [PathBuf],
  /// Entry point file, relative to `work_path`.
  pub entrypoint: &'a str,
  /// Directory the build reads from and writes intermediate output into.
  pub work_path: &'a Path,
}

impl BuildRequest<'_> {
  pub fn has_entrypoint(&self) -> bool {
    self.files.iter().any(|file| file == Path::new(self.entrypoint))
  }
}

/// A framework build that turns sources into routes and outputs.
pub trait FrameworkBuilder {
  fn build(&self, request: BuildRequest<'_>) -> impl Future<Output = Result<BuildResult, BuildError>> + Send;
}
