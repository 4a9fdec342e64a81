//! Command-driven framework build.
//!
//! Runs a shell command inside the workspace and reads back the JSON build
//! document it is expected to write. The command sees:
//!
//! - `NEXTTF_ENTRYPOINT`: the entry point file
//! - `NEXTTF_WORK_PATH`: the workspace directory (also its working directory)
//! - `NEXTTF_BUILD_OUTPUT`: where to write the build document
//!
//! The document mirrors the framework's own output format:
//!
//! ```json
//! {
//!   "routes": [{ "src": "/old", "dest": "/new" }],
//!   "output": {
//!     "index": { "type": "Lambda", "handler": "index.handler", "runtime": "nodejs20.x", "zipPath": "lambdas/index.zip" },
//!     "about.html": { "type": "FileFsRef", "fsPath": ".next/server/pages/about.html" },
//!     "robots.txt": { "type": "FileBlob", "data": "User-agent: *" }
//!   }
//! }
//! ```
//!
//! Relative paths are resolved against the workspace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use super::types::{BuildError, BuildRequest, FrameworkBuilder};
use crate::consts::BUILD_OUTPUT_FILE_NAME;
use crate::output::{BuildOutput, BuildResult, Lambda, Prerender, StaticFile};
use crate::route::Route;

/// Runs the framework build as a shell command.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
  /// Command string passed to the shell.
  pub command: String,
  /// Shell override. Defaults to `/bin/sh` (Unix) or PowerShell (Windows).
  pub shell: Option<String>,
}

impl CommandBuilder {
  pub fn new(command: &str) -> Self {
    Self {
      command: command.to_string(),
      shell: None,
    }
  }

  pub fn with_shell(mut self, shell: &str) -> Self {
    self.shell = Some(shell.to_string());
    self
  }
}

impl FrameworkBuilder for CommandBuilder {
  async fn build(&self, request: BuildRequest<'_>) -> Result<BuildResult, BuildError> {
    if !request.has_entrypoint() {
      return Err(BuildError::MissingEntrypoint(request.entrypoint.to_string()));
    }

    let output_path = request.work_path.join(BUILD_OUTPUT_FILE_NAME);
    let (shell_cmd, shell_args) = shell_invocation(self.shell.as_deref());

    info!(cmd = %self.command, work_path = ?request.work_path, files = request.files.len(), "running framework build");

    let output = Command::new(shell_cmd)
      .args(shell_args)
      .arg(&self.command)
      .current_dir(request.work_path)
      .env("NEXTTF_ENTRYPOINT", request.entrypoint)
      .env("NEXTTF_WORK_PATH", request.work_path)
      .env("NEXTTF_BUILD_OUTPUT", &output_path)
      .stdin(Stdio::null())
      .output()
      .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "build stdout");
    }
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "build stderr");
    }

    if !output.status.success() {
      return Err(BuildError::CmdFailed {
        cmd: self.command.clone(),
        code: output.status.code(),
      });
    }

    let raw = tokio::fs::read(&output_path)
      .await
      .map_err(|e| BuildError::InvalidOutput {
        path: output_path.clone(),
        message: e.to_string(),
      })?;
    let document: BuildDocument = serde_json::from_slice(&raw).map_err(|e| BuildError::InvalidOutput {
      path: output_path.clone(),
      message: e.to_string(),
    })?;

    document.load(request.work_path).await
  }
}

/// The build document written by the command.
#[derive(Debug, Deserialize)]
struct BuildDocument {
  #[serde(default)]
  routes: Vec<Route>,
  /// Entries stay untyped until `load` so an unknown `type` tag can still be
  /// reported by name.
  #[serde(default)]
  output: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawOutput {
  Lambda {
    handler: String,
    runtime: String,
    #[serde(rename = "zipPath")]
    zip_path: PathBuf,
  },
  FileFsRef {
    #[serde(rename = "fsPath")]
    fs_path: PathBuf,
  },
  FileBlob {
    data: String,
  },
  Prerender {
    #[serde(default)]
    expiration: Option<u64>,
  },
  #[serde(other)]
  Unsupported,
}

impl BuildDocument {
  /// Resolve paths against `work_path` and load lambda payloads.
  async fn load(self, work_path: &Path) -> Result<BuildResult, BuildError> {
    let mut output = BTreeMap::new();

    for (key, value) in self.output {
      let kind = value.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
      let raw: RawOutput = serde_json::from_value(value).map_err(|e| BuildError::InvalidOutput {
        path: work_path.join(BUILD_OUTPUT_FILE_NAME),
        message: format!("output {key:?}: {e}"),
      })?;

      let entry = match raw {
        RawOutput::Lambda {
          handler,
          runtime,
          zip_path,
        } => {
          let path = work_path.join(zip_path);
          let payload = tokio::fs::read(&path)
            .await
            .map_err(|source| BuildError::LoadArtifact { path, source })?;
          BuildOutput::Lambda(Lambda {
            handler,
            runtime,
            payload,
          })
        }
        RawOutput::FileFsRef { fs_path } => BuildOutput::File(StaticFile::FsRef {
          fs_path: work_path.join(fs_path),
        }),
        RawOutput::FileBlob { data } => BuildOutput::File(StaticFile::Blob { data: data.into_bytes() }),
        RawOutput::Prerender { expiration } => BuildOutput::Prerender(Prerender { expiration }),
        RawOutput::Unsupported => BuildOutput::Unsupported { kind },
      };
      output.insert(key, entry);
    }

    Ok(BuildResult {
      routes: self.routes,
      output,
    })
  }
}

#[cfg(unix)]
const DEFAULT_SHELL: &str = "/bin/sh";
#[cfg(windows)]
const DEFAULT_SHELL: &str = "powershell.exe";

/// Shell program and the flags that make it run a single command string.
///
/// The flags are picked from the program's file stem, so `/usr/bin/pwsh` and
/// `pwsh` behave the same.
fn shell_invocation(shell: Option<&str>) -> (&str, &'static [&'static str]) {
  let program = shell.unwrap_or(DEFAULT_SHELL);
  let stem = Path::new(program)
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or(program)
    .to_ascii_lowercase();

  let flags: &'static [&'static str] = match stem.as_str() {
    "powershell" | "pwsh" => &["-NoProfile", "-NonInteractive", "-Command"],
    "cmd" => &["/C"],
    _ => &["-c"],
  };
  (program, flags)
}
