//! Static website bundle.
//!
//! Every static file is stored in one zip archive under its output key. File
//! contents are read asynchronously on the calling task and handed, one entry
//! at a time, to a blocking worker that owns the zip encoder. The channel
//! between them holds a single entry, so at most one file is read ahead of the
//! encoder.
//!
//! The archive is built at `<dest>.partial` and only renamed to `dest` once
//! the central directory has been written and the file synced. A failed read
//! stops the worker before it finalizes and the partial file is removed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::types::{ArtifactError, StaticBundle};
use crate::output::StaticFile;
use crate::util::hash::{ContentHash, hash_file};
use crate::util::path::{discard_partial, partial_path};

enum Entry {
  File { name: String, data: Vec<u8> },
  /// All entries sent; write the central directory.
  Finish,
}

/// What the worker reports after a successful finalize.
#[derive(Debug)]
struct Finalized {
  entries: usize,
  size: u64,
  sha256: ContentHash,
}

/// Write all static files into a single zip archive at `dest`.
///
/// Returns only after the archive is complete on disk. On any error no file
/// exists at `dest`.
pub async fn write_static_bundle(
  files: BTreeMap<String, StaticFile>,
  dest: &Path,
) -> Result<StaticBundle, ArtifactError> {
  info!(files = files.len(), path = ?dest, "writing static bundle");

  let partial = partial_path(dest);
  let (tx, rx) = mpsc::channel(1);

  let worker = tokio::task::spawn_blocking({
    let partial = partial.clone();
    move || encode_archive(&partial, rx)
  });

  let fed = feed_entries(files, &tx, dest).await;
  if fed.is_ok() && tx.send(Entry::Finish).await.is_err() {
    debug!(path = ?dest, "archive worker exited before finish");
  }
  drop(tx);

  // A panicked worker is handled like any other encoder failure.
  let encoded = worker.await.map_err(ArtifactError::from).and_then(|encoded| encoded);

  let finalized = settle(fed, encoded, &partial).await?;

  if let Err(e) = tokio::fs::rename(&partial, dest).await {
    discard_partial(&partial).await;
    return Err(e.into());
  }

  info!(
    path = ?dest,
    entries = finalized.entries,
    size = finalized.size,
    "static bundle written"
  );

  Ok(StaticBundle {
    path: dest.to_path_buf(),
    entries: finalized.entries,
    size: finalized.size,
    sha256: finalized.sha256,
  })
}

/// Combine the feeder and worker outcomes, removing the partial archive if
/// either failed.
async fn settle(
  fed: Result<(), ArtifactError>,
  encoded: Result<Finalized, ArtifactError>,
  partial: &Path,
) -> Result<Finalized, ArtifactError> {
  match (fed, encoded) {
    (Ok(()), Ok(finalized)) => Ok(finalized),
    // The worker's own error explains why it stopped accepting entries.
    (Err(ArtifactError::ArchiveAborted { .. }), Err(e)) | (Err(e), _) | (Ok(()), Err(e)) => {
      discard_partial(partial).await;
      Err(e)
    }
  }
}

/// Read each file and pass it to the worker.
///
/// A read failure returns immediately without sending `Finish`, which leaves
/// the worker unable to finalize.
async fn feed_entries(
  files: BTreeMap<String, StaticFile>,
  tx: &mpsc::Sender<Entry>,
  dest: &Path,
) -> Result<(), ArtifactError> {
  for (key, file) in files {
    let data = file
      .into_bytes()
      .await
      .map_err(|source| ArtifactError::ReadStatic { key: key.clone(), source })?;

    debug!(key = %key, size = data.len(), "adding static file");

    if tx.send(Entry::File { name: key, data }).await.is_err() {
      return Err(ArtifactError::ArchiveAborted {
        path: dest.to_path_buf(),
      });
    }
  }
  Ok(())
}

/// Blocking side: encode received entries into the archive at `path`.
fn encode_archive(path: &Path, mut rx: mpsc::Receiver<Entry>) -> Result<Finalized, ArtifactError> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }

  let mut zip = ZipWriter::new(File::create(path)?);
  let options = entry_options();
  let mut entries = 0;

  while let Some(entry) = rx.blocking_recv() {
    match entry {
      Entry::File { name, data } => {
        zip.start_file(name, options).map_err(|source| archive_error(path, source))?;
        zip.write_all(&data)?;
        entries += 1;
      }
      Entry::Finish => {
        let file = zip.finish().map_err(|source| archive_error(path, source))?;
        file.sync_all()?;
        let size = file.metadata()?.len();
        drop(file);

        return Ok(Finalized {
          entries,
          size,
          sha256: hash_file(path)?,
        });
      }
    }
  }

  Err(ArtifactError::ArchiveAborted {
    path: path.to_path_buf(),
  })
}

/// Entry options with a fixed timestamp so identical inputs give identical
/// archives.
fn entry_options() -> SimpleFileOptions {
  SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .unix_permissions(0o644)
}

fn archive_error(path: &Path, source: zip::result::ZipError) -> ArtifactError {
  ArtifactError::Archive {
    path: path.to_path_buf(),
    source,
  }
}
