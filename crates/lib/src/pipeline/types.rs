//! Types for running the output pipeline.
//!
//! This module defines the configuration, stage tracking, error and report
//! types used by [`run_pipeline`](super::run_pipeline).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::{ArtifactError, LambdaArtifact, StaticBundle};
use crate::build::BuildError;
use crate::consts::DEFAULT_ENTRYPOINT;
use crate::manifest::{ManifestError, OutputManifest};

/// How much of the run is echoed to the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
  /// Additionally log the resolved route list.
  Verbose,
  #[default]
  None,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// Base directory for source enumeration and the output directory.
  pub cwd: PathBuf,

  /// Build directly in `cwd` instead of a temporary copy.
  pub skip_download: bool,

  /// Erase the temporary workspace after the run.
  pub delete_build_cache: bool,

  pub log_level: LogLevel,

  /// Entry point handed to the framework build.
  pub entrypoint: String,
}

impl PipelineConfig {
  pub fn new(cwd: impl Into<PathBuf>) -> Self {
    Self {
      cwd: cwd.into(),
      ..Default::default()
    }
  }
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      cwd: PathBuf::from("."),
      skip_download: false,
      delete_build_cache: true,
      log_level: LogLevel::None,
      entrypoint: DEFAULT_ENTRYPOINT.to_string(),
    }
  }
}

/// Progress of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Idle,
  WorkspaceReady,
  Built,
  Classified,
  ArtifactsWritten,
  ManifestWritten,
  Done,
  Failed,
}

impl Stage {
  /// The stage that follows on success, if any.
  pub fn next(self) -> Option<Stage> {
    match self {
      Stage::Idle => Some(Stage::WorkspaceReady),
      Stage::WorkspaceReady => Some(Stage::Built),
      Stage::Built => Some(Stage::Classified),
      Stage::Classified => Some(Stage::ArtifactsWritten),
      Stage::ArtifactsWritten => Some(Stage::ManifestWritten),
      Stage::ManifestWritten => Some(Stage::Done),
      Stage::Done | Stage::Failed => None,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Stage::Done | Stage::Failed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Stage::Idle => "idle",
      Stage::WorkspaceReady => "workspace-ready",
      Stage::Built => "built",
      Stage::Classified => "classified",
      Stage::ArtifactsWritten => "artifacts-written",
      Stage::ManifestWritten => "manifest-written",
      Stage::Done => "done",
      Stage::Failed => "failed",
    }
  }
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// The workspace or output directory could not be prepared.
  #[error("workspace error at {path}: {source}")]
  Workspace {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Source files could not be listed.
  #[error("failed to enumerate sources in {path}: {message}")]
  Sources { path: PathBuf, message: String },

  /// The framework build failed.
  #[error("build failed: {0}")]
  Build(#[from] BuildError),

  /// The build id file is missing or unreadable.
  #[error("failed to read build id from {path}: {source}")]
  BuildId {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Writing lambda archives or the static bundle failed.
  #[error("artifact error: {0}")]
  Artifact(#[from] ArtifactError),

  /// Writing the manifest failed.
  #[error("manifest error: {0}")]
  Manifest(#[from] ManifestError),
}

impl PipelineError {
  /// The last stage reached before the failure.
  pub fn stage(&self) -> Stage {
    match self {
      PipelineError::Workspace { .. } | PipelineError::Sources { .. } => Stage::Idle,
      PipelineError::Build(_) => Stage::WorkspaceReady,
      PipelineError::BuildId { .. } => Stage::Built,
      PipelineError::Artifact(_) => Stage::Classified,
      PipelineError::Manifest(_) => Stage::ArtifactsWritten,
    }
  }
}

/// Description of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
  pub output_dir: PathBuf,
  pub manifest_path: PathBuf,
  pub manifest: OutputManifest,
  pub lambdas: BTreeMap<String, LambdaArtifact>,
  pub static_bundle: StaticBundle,
}
