//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated project directory.
///
/// Each test gets its own temporary project with a `package.json`, so the
/// build and its `.next-tf/` output never touch the repository.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a project containing only `package.json`.
  pub fn project() -> Self {
    let env = Self::empty();
    env.write_file("package.json", r#"{ "name": "fixture-app" }"#);
    env
  }

  /// Create an empty project directory.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Canonical project directory.
  pub fn project_path(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// `<project>/.next-tf`
  pub fn output_path(&self) -> PathBuf {
    self.project_path().join(".next-tf")
  }

  pub fn output_file(&self, relative_path: &str) -> PathBuf {
    self.output_path().join(relative_path)
  }

  /// A `next-tf build` command pointed at this project.
  ///
  /// Clears the `NEXTTF_*` variables so the caller's environment cannot leak
  /// into the run.
  pub fn build_cmd(&self, build_command: &str) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("next-tf");
    for var in ["NEXTTF_BUILD_COMMAND", "NEXTTF_CWD", "NEXTTF_SKIP_DOWNLOAD", "NEXTTF_LOG_LEVEL"] {
      cmd.env_remove(var);
    }
    cmd.arg("build").arg("--cwd").arg(self.project_path());
    cmd.arg("--build-command").arg(build_command);
    cmd
  }
}

/// Names of the entries in a zip archive, in archive order.
pub fn zip_entry_names(path: &Path) -> Vec<String> {
  let file = std::fs::File::open(path).unwrap();
  let archive = zip::ZipArchive::new(file).unwrap();
  archive.file_names().map(str::to_string).collect()
}

/// Contents of one entry in a zip archive.
pub fn zip_entry(path: &Path, name: &str) -> String {
  use std::io::Read;

  let file = std::fs::File::open(path).unwrap();
  let mut archive = zip::ZipArchive::new(file).unwrap();
  let mut entry = archive.by_name(name).unwrap();
  let mut content = String::new();
  entry.read_to_string(&mut content).unwrap();
  content
}
