//! Framework build output and its classification.
//!
//! The framework build returns a single map mixing lambdas, static files and
//! kinds this pipeline does not handle. [`classify`] splits it into the two
//! collections the artifact writers consume.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::route::Route;

/// A pre-packaged compute unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
  /// Entry point handler, e.g. `index.handler`.
  pub handler: String,
  /// Runtime identifier, e.g. `nodejs20.x`.
  pub runtime: String,
  /// Zipped code, written to disk verbatim.
  pub payload: Vec<u8>,
}

/// A static asset destined for the website bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticFile {
  /// File on disk, streamed when the bundle is written.
  FsRef { fs_path: PathBuf },
  /// Content already in memory.
  Blob { data: Vec<u8> },
}

impl StaticFile {
  /// Read the whole content, consuming the reference.
  pub async fn into_bytes(self) -> io::Result<Vec<u8>> {
    match self {
      StaticFile::FsRef { fs_path } => {
        let mut file = tokio::fs::File::open(&fs_path).await?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        Ok(data)
      }
      StaticFile::Blob { data } => Ok(data),
    }
  }
}

/// Prerendered page with revalidation settings. Not packaged by this pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prerender {
  pub expiration: Option<u64>,
}

/// One entry of the framework build's output map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
  Lambda(Lambda),
  File(StaticFile),
  Prerender(Prerender),
  /// Output kind introduced by a newer build.
  Unsupported { kind: String },
}

/// Everything the framework build hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildResult {
  /// Routing rules, in match order.
  pub routes: Vec<Route>,
  /// Output map. Keys are unique across all kinds.
  pub output: BTreeMap<String, BuildOutput>,
}

/// Build output split by kind.
#[derive(Debug, Default, PartialEq)]
pub struct Classified {
  pub lambdas: BTreeMap<String, Lambda>,
  pub static_files: BTreeMap<String, StaticFile>,
}

/// Partition the output map into lambdas and static files.
///
/// Keys are kept as-is. Prerenders and unsupported kinds are dropped.
pub fn classify(output: BTreeMap<String, BuildOutput>) -> Classified {
  let mut classified = Classified::default();

  for (key, entry) in output {
    match entry {
      BuildOutput::Lambda(lambda) => {
        classified.lambdas.insert(key, lambda);
      }
      BuildOutput::File(file) => {
        classified.static_files.insert(key, file);
      }
      BuildOutput::Prerender(prerender) => {
        debug!(key = %key, expiration = ?prerender.expiration, "skipping prerender");
      }
      BuildOutput::Unsupported { kind } => {
        debug!(key = %key, kind = %kind, "ignoring build output");
      }
    }
  }

  debug!(
    lambdas = classified.lambdas.len(),
    static_files = classified.static_files.len(),
    "classified build output"
  );

  classified
}
