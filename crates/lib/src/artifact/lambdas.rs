//! Lambda archives.
//!
//! Each lambda's payload is already a zip produced by the framework build; it
//! is written verbatim to `lambdas/<key>.zip`. Writes run as independent
//! tasks, each taking ownership of its payload and dropping it once flushed.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::types::{ArtifactError, LambdaArtifact};
use crate::consts::LAMBDAS_DIR_NAME;
use crate::output::Lambda;
use crate::util::hash::hash_bytes;
use crate::util::path::relative_key_path;

/// Archive path for `key`, relative to the output directory.
pub fn lambda_filename(key: &str) -> String {
  format!("{LAMBDAS_DIR_NAME}/{key}.zip")
}

/// Write every lambda payload under `out_dir`.
///
/// Every key is validated before the first write starts. All writes are then
/// started before any result is inspected, so one failing unit does not stop
/// the others. The first error encountered is returned once every
/// task has finished.
pub async fn write_lambdas(
  lambdas: BTreeMap<String, Lambda>,
  out_dir: &Path,
) -> Result<BTreeMap<String, LambdaArtifact>, ArtifactError> {
  info!(lambdas = lambdas.len(), "writing lambda archives");

  // Validate every key before any write starts.
  let mut jobs = Vec::with_capacity(lambdas.len());
  for (key, lambda) in lambdas {
    let Some(relative) = relative_key_path(&key) else {
      return Err(ArtifactError::InvalidKey(key));
    };
    let mut path = out_dir.join(LAMBDAS_DIR_NAME).join(relative);
    path.as_mut_os_string().push(".zip");
    jobs.push((key, lambda, path));
  }

  let mut tasks = JoinSet::new();

  for (key, lambda, path) in jobs {
    tasks.spawn(async move {
      let Lambda {
        handler,
        runtime,
        payload,
      } = lambda;

      if let Err(source) = write_payload(&path, &payload).await {
        return Err(ArtifactError::WriteLambda { key, path, source });
      }
      debug!(key = %key, path = ?path, size = payload.len(), "lambda archive written");

      let artifact = LambdaArtifact {
        handler,
        runtime,
        filename: lambda_filename(&key),
        size: payload.len() as u64,
        sha256: hash_bytes(&payload),
      };
      Ok((key, artifact))
    });
  }

  let mut written = BTreeMap::new();
  let mut first_error = None;

  while let Some(joined) = tasks.join_next().await {
    match joined? {
      Ok((key, artifact)) => {
        written.insert(key, artifact);
      }
      Err(e) => {
        error!(error = %e, "lambda write failed");
        first_error.get_or_insert(e);
      }
    }
  }

  match first_error {
    Some(e) => Err(e),
    None => Ok(written),
  }
}

async fn write_payload(path: &Path, payload: &[u8]) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  let mut file = tokio::fs::File::create(path).await?;
  file.write_all(payload).await?;
  file.flush().await?;
  Ok(())
}
