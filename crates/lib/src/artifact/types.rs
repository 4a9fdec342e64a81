//! Types shared by the artifact writers.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::util::hash::ContentHash;

/// Errors that can occur while writing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
  /// A static file could not be read into the bundle.
  #[error("failed to read static file {key}: {source}")]
  ReadStatic {
    key: String,
    #[source]
    source: std::io::Error,
  },

  /// A lambda archive could not be written.
  #[error("failed to write lambda {key} to {path}: {source}")]
  WriteLambda {
    key: String,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// An output key cannot be mapped to a path inside the output directory.
  #[error("invalid output key: {0:?}")]
  InvalidKey(String),

  /// The zip encoder failed.
  #[error("archive error for {path}: {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  /// The archive stopped receiving entries before it was finalized.
  #[error("archive {path} was not finalized")]
  ArchiveAborted { path: PathBuf },

  /// I/O error while writing.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A writer task panicked or was cancelled.
  #[error("writer task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

/// A lambda archive on disk. The payload itself is gone once this exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaArtifact {
  pub handler: String,
  pub runtime: String,
  /// Path relative to the output directory, `/`-separated.
  pub filename: String,
  pub size: u64,
  pub sha256: ContentHash,
}

/// The finalized static website bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticBundle {
  pub path: PathBuf,
  pub entries: usize,
  pub size: u64,
  pub sha256: ContentHash,
}
