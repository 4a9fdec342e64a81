//! The routing manifest (`config.json`).
//!
//! The manifest is the single file that makes an output directory valid: it
//! links every route to either a lambda archive or the static bundle. It is
//! written last, and only after all artifacts it names exist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::LambdaArtifact;
use crate::consts::{CDN_DIRECT_PREFIX, CONFIG_FILE_NAME, STATIC_ARCHIVE_NAME};
use crate::route::{Route, lambda_route, static_route};
use crate::util::path::{discard_partial, partial_path};

/// Errors that can occur while persisting the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to serialize manifest: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("failed to write manifest to {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Manifest entry for one lambda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaEntry {
  pub handler: String,
  pub runtime: String,
  /// Archive path relative to the output directory.
  pub filename: String,
  pub route: String,
}

/// The complete `config.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputManifest {
  pub lambdas: BTreeMap<String, LambdaEntry>,
  pub static_routes: Vec<String>,
  pub routes: Vec<Route>,
  pub build_id: String,
  pub static_files_archive: String,
}

impl OutputManifest {
  /// Assemble the manifest from written lambda archives, the static routes
  /// and the build's own route list.
  pub fn new(
    lambdas: &BTreeMap<String, LambdaArtifact>,
    static_routes: Vec<String>,
    routes: Vec<Route>,
    build_id: String,
  ) -> Self {
    let lambdas = lambdas
      .iter()
      .map(|(key, artifact)| {
        let entry = LambdaEntry {
          handler: artifact.handler.clone(),
          runtime: artifact.runtime.clone(),
          filename: artifact.filename.clone(),
          route: lambda_route(key),
        };
        (key.clone(), entry)
      })
      .collect();

    Self {
      lambdas,
      static_routes,
      routes,
      build_id,
      static_files_archive: STATIC_ARCHIVE_NAME.to_string(),
    }
  }

  /// Serialize as indented JSON to `<out_dir>/config.json`.
  ///
  /// The document is written next to the target and renamed into place, so a
  /// reader never sees a truncated manifest.
  pub async fn write(&self, out_dir: &Path) -> Result<PathBuf, ManifestError> {
    let json = serde_json::to_string_pretty(self)?;
    let path = out_dir.join(CONFIG_FILE_NAME);
    let partial = partial_path(&path);

    debug!(path = ?partial, bytes = json.len(), "writing manifest");

    let written = match tokio::fs::write(&partial, json.as_bytes()).await {
      Ok(()) => tokio::fs::rename(&partial, &path).await,
      Err(e) => Err(e),
    };
    if let Err(source) = written {
      discard_partial(&partial).await;
      return Err(ManifestError::Write { path, source });
    }

    info!(
      path = ?path,
      lambdas = self.lambdas.len(),
      static_routes = self.static_routes.len(),
      routes = self.routes.len(),
      "manifest written"
    );

    Ok(path)
  }
}

/// Proxy routes for static files.
///
/// Keys under the CDN-direct prefix are skipped; everything else becomes
/// `/<key>`, in the order given.
pub fn static_routes<'a>(keys: impl IntoIterator<Item = &'a String>) -> Vec<String> {
  keys
    .into_iter()
    .filter(|key| !key.starts_with(CDN_DIRECT_PREFIX))
    .map(|key| static_route(key))
    .collect()
}
