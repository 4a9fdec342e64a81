//! Output pipeline orchestration.
//!
//! A run moves through these stages:
//! 1. Acquire a workspace and make sure the output directory exists
//! 2. Invoke the framework build once
//! 3. Classify its output and read the build id
//! 4. Write lambda archives and the static bundle concurrently
//! 5. Write the manifest
//!
//! The manifest is the barrier: it is only written after both artifact writers
//! succeed. Artifacts already on disk are not rolled back on failure, but
//! without a manifest the output directory is not valid. The workspace is
//! released on every exit path.

pub mod workspace;
mod types;

use std::path::Path;

use tracing::{debug, error, info};

use crate::artifact::{write_lambdas, write_static_bundle};
use crate::build::sources::{copy_sources, enumerate_sources};
use crate::build::{BuildRequest, FrameworkBuilder};
use crate::consts::{BUILD_ID_PATH, STATIC_ARCHIVE_NAME};
use crate::manifest::{OutputManifest, static_routes};
use crate::output::{BuildResult, classify};
use crate::route::Route;

pub use types::{BuildReport, LogLevel, PipelineConfig, PipelineError, Stage};
pub use workspace::Workspace;

/// Run the full pipeline with `builder` as the framework build.
///
/// Returns the report on success. Every failure is logged once here, with the
/// stage the run had reached, and returned to the caller.
pub async fn run_pipeline<B: FrameworkBuilder>(
  builder: &B,
  config: &PipelineConfig,
) -> Result<BuildReport, PipelineError> {
  info!(cwd = ?config.cwd, skip_download = config.skip_download, "starting output pipeline");

  let mut stage = Stage::Idle;
  match execute(builder, config, &mut stage).await {
    Ok(report) => {
      advance(&mut stage, Stage::Done);
      info!(
        output_dir = ?report.output_dir,
        lambdas = report.lambdas.len(),
        static_files = report.static_bundle.entries,
        "output pipeline complete"
      );
      Ok(report)
    }
    Err(e) => {
      error!(stage = %stage, error = %e, "output pipeline failed");
      advance(&mut stage, Stage::Failed);
      Err(e)
    }
  }
}

fn advance(stage: &mut Stage, to: Stage) {
  debug!(from = %stage, to = %to, "pipeline stage");
  *stage = to;
}

async fn execute<B: FrameworkBuilder>(
  builder: &B,
  config: &PipelineConfig,
  stage: &mut Stage,
) -> Result<BuildReport, PipelineError> {
  let cwd = dunce::canonicalize(&config.cwd).map_err(|source| PipelineError::Workspace {
    path: config.cwd.clone(),
    source,
  })?;
  let out_dir = cwd.join(crate::consts::OUTPUT_DIR_NAME);

  let files = {
    let root = cwd.clone();
    tokio::task::spawn_blocking(move || enumerate_sources(&root))
      .await
      .map_err(|e| PipelineError::Sources {
        path: cwd.clone(),
        message: e.to_string(),
      })?
      .map_err(|e| PipelineError::Sources {
        path: cwd.clone(),
        message: e.to_string(),
      })?
  };

  let workspace = acquire_workspace(config, &cwd, &files).await?;
  tokio::fs::create_dir_all(&out_dir)
    .await
    .map_err(|source| PipelineError::Workspace {
      path: out_dir.clone(),
      source,
    })?;
  advance(stage, Stage::WorkspaceReady);

  let result = builder
    .build(BuildRequest {
      files: &files,
      entrypoint: &config.entrypoint,
      work_path: workspace.path(),
    })
    .await?;
  advance(stage, Stage::Built);

  let BuildResult { routes, output } = result;
  if config.log_level == LogLevel::Verbose {
    log_routes(&routes);
  }
  let classified = classify(output);
  let build_id = read_build_id(workspace.path()).await?;
  advance(stage, Stage::Classified);

  let static_routes = static_routes(classified.static_files.keys());
  let archive_path = out_dir.join(STATIC_ARCHIVE_NAME);
  // Both writers always run to completion so each can clean up after itself.
  let (lambdas, static_bundle) = tokio::join!(
    write_lambdas(classified.lambdas, &out_dir),
    write_static_bundle(classified.static_files, &archive_path)
  );
  let lambdas = lambdas?;
  let static_bundle = static_bundle?;
  advance(stage, Stage::ArtifactsWritten);

  let manifest = OutputManifest::new(&lambdas, static_routes, routes, build_id);
  let manifest_path = manifest.write(&out_dir).await?;
  advance(stage, Stage::ManifestWritten);

  drop(workspace);

  Ok(BuildReport {
    output_dir: out_dir,
    manifest_path,
    manifest,
    lambdas,
    static_bundle,
  })
}

async fn acquire_workspace(
  config: &PipelineConfig,
  cwd: &Path,
  files: &[std::path::PathBuf],
) -> Result<Workspace, PipelineError> {
  if config.skip_download {
    debug!(path = ?cwd, "building in local workspace");
    return Ok(Workspace::local(cwd));
  }

  let workspace = Workspace::temporary(config.delete_build_cache).map_err(|source| PipelineError::Workspace {
    path: std::env::temp_dir(),
    source,
  })?;
  copy_sources(cwd, files, workspace.path())
    .await
    .map_err(|source| PipelineError::Workspace {
      path: workspace.path().to_path_buf(),
      source,
    })?;
  Ok(workspace)
}

/// Read the build id written by the framework build, verbatim.
async fn read_build_id(work_path: &Path) -> Result<String, PipelineError> {
  let path = work_path.join(BUILD_ID_PATH);
  tokio::fs::read_to_string(&path)
    .await
    .map_err(|source| PipelineError::BuildId { path, source })
}

fn log_routes(routes: &[Route]) {
  info!(count = routes.len(), "resolved routes");
  for (index, route) in routes.iter().enumerate() {
    match serde_json::to_string(route) {
      Ok(json) => info!(index, route = %json, "route"),
      Err(e) => debug!(index, error = %e, "route not printable"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;
  use std::fs::File;
  use std::path::PathBuf;
  use std::sync::Mutex;

  use tempfile::TempDir;
  use tracing_test::traced_test;

  use crate::build::BuildError;
  use crate::consts::{CONFIG_FILE_NAME, OUTPUT_DIR_NAME};
  use crate::output::{BuildOutput, Lambda, Prerender, StaticFile};

  /// Stands in for the framework build: writes a build id into the
  /// workspace and returns a fixed result.
  struct FakeBuilder {
    result: BuildResult,
    build_id: Option<&'static str>,
    seen_work_path: Mutex<Option<PathBuf>>,
  }

  impl FakeBuilder {
    fn new(result: BuildResult) -> Self {
      Self {
        result,
        build_id: Some("abc123"),
        seen_work_path: Mutex::new(None),
      }
    }

    fn work_path(&self) -> PathBuf {
      self.seen_work_path.lock().unwrap().clone().unwrap()
    }
  }

  impl FrameworkBuilder for FakeBuilder {
    async fn build(&self, request: BuildRequest<'_>) -> Result<BuildResult, BuildError> {
      if !request.has_entrypoint() {
        return Err(BuildError::MissingEntrypoint(request.entrypoint.to_string()));
      }
      *self.seen_work_path.lock().unwrap() = Some(request.work_path.to_path_buf());
      if let Some(id) = self.build_id {
        let path = request.work_path.join(BUILD_ID_PATH);
        tokio::fs::create_dir_all(path.parent().unwrap()).await?;
        tokio::fs::write(path, id).await?;
      }
      Ok(self.result.clone())
    }
  }

  fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("package.json"), "{}").unwrap();
    temp
  }

  fn config(cwd: &Path) -> PipelineConfig {
    PipelineConfig::new(cwd)
  }

  fn scenario() -> BuildResult {
    BuildResult {
      routes: vec![Route::rewrite("/old", "/new")],
      output: BTreeMap::from([
        (
          "index".to_string(),
          BuildOutput::Lambda(Lambda {
            handler: "index.handler".to_string(),
            runtime: "node".to_string(),
            payload: b"PK-index".to_vec(),
          }),
        ),
        (
          "about.html".to_string(),
          BuildOutput::File(StaticFile::Blob {
            data: b"<h1>about</h1>".to_vec(),
          }),
        ),
      ]),
    }
  }

  fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
  }

  #[tokio::test]
  async fn end_to_end_writes_manifest_and_artifacts() {
    let project = project();
    let builder = FakeBuilder::new(scenario());

    let report = run_pipeline(&builder, &config(project.path())).await.unwrap();

    let out_dir = project.path().join(OUTPUT_DIR_NAME);
    let config_json: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(out_dir.join(CONFIG_FILE_NAME)).unwrap()).unwrap();

    assert_eq!(config_json["lambdas"]["index"]["route"], "/");
    assert_eq!(config_json["lambdas"]["index"]["handler"], "index.handler");
    assert_eq!(config_json["lambdas"]["index"]["runtime"], "node");
    assert_eq!(config_json["lambdas"]["index"]["filename"], "lambdas/index.zip");
    assert_eq!(config_json["staticRoutes"], serde_json::json!(["/about.html"]));
    assert_eq!(config_json["routes"], serde_json::json!([{ "src": "/old", "dest": "/new" }]));
    assert_eq!(config_json["buildId"], "abc123");
    assert_eq!(config_json["staticFilesArchive"], "static-website-files.zip");

    assert_eq!(std::fs::read(out_dir.join("lambdas/index.zip")).unwrap(), b"PK-index");
    assert_eq!(zip_names(&out_dir.join(STATIC_ARCHIVE_NAME)), vec!["about.html"]);

    assert_eq!(report.manifest.build_id, "abc123");
    assert_eq!(report.static_bundle.entries, 1);
    assert_eq!(report.lambdas.len(), 1);
  }

  #[tokio::test]
  async fn cdn_direct_files_are_bundled_but_not_routed() {
    let project = project();
    let mut result = scenario();
    result.output.insert(
      "_next/static/chunks/main.js".to_string(),
      BuildOutput::File(StaticFile::Blob { data: b"js".to_vec() }),
    );
    result
      .output
      .insert("blog".to_string(), BuildOutput::Prerender(Prerender::default()));
    let builder = FakeBuilder::new(result);

    let report = run_pipeline(&builder, &config(project.path())).await.unwrap();

    assert_eq!(report.manifest.static_routes, vec!["/about.html"]);
    assert!(!report.manifest.lambdas.contains_key("blog"));
    let mut names = zip_names(&report.static_bundle.path);
    names.sort();
    assert_eq!(names, vec!["_next/static/chunks/main.js", "about.html"]);
  }

  #[tokio::test]
  async fn failed_static_read_prevents_manifest() {
    let project = project();
    let mut result = scenario();
    result.output.insert(
      "broken.css".to_string(),
      BuildOutput::File(StaticFile::FsRef {
        fs_path: project.path().join("does-not-exist.css"),
      }),
    );
    let builder = FakeBuilder::new(result);

    let err = run_pipeline(&builder, &config(project.path())).await.unwrap_err();

    assert!(matches!(err, PipelineError::Artifact(_)), "got {err:?}");
    assert_eq!(err.stage(), Stage::Classified);
    let out_dir = project.path().join(OUTPUT_DIR_NAME);
    assert!(!out_dir.join(CONFIG_FILE_NAME).exists());
    assert!(!out_dir.join(STATIC_ARCHIVE_NAME).exists());
  }

  #[tokio::test]
  async fn temporary_workspace_is_erased_after_success() {
    let project = project();
    let builder = FakeBuilder::new(scenario());

    run_pipeline(&builder, &config(project.path())).await.unwrap();

    let work_path = builder.work_path();
    assert_ne!(work_path, dunce::canonicalize(project.path()).unwrap());
    assert!(!work_path.exists());
  }

  #[tokio::test]
  async fn temporary_workspace_is_erased_after_failure() {
    let project = project();
    let mut builder = FakeBuilder::new(scenario());
    builder.build_id = None;

    let err = run_pipeline(&builder, &config(project.path())).await.unwrap_err();

    assert!(matches!(err, PipelineError::BuildId { .. }), "got {err:?}");
    assert!(!builder.work_path().exists());
  }

  #[tokio::test]
  async fn build_cache_is_kept_when_requested() {
    let project = project();
    let builder = FakeBuilder::new(scenario());
    let mut config = config(project.path());
    config.delete_build_cache = false;

    run_pipeline(&builder, &config).await.unwrap();

    let work_path = builder.work_path();
    assert!(work_path.join("package.json").exists());
    assert_eq!(std::fs::read_to_string(work_path.join(BUILD_ID_PATH)).unwrap(), "abc123");
    std::fs::remove_dir_all(work_path).unwrap();
  }

  #[tokio::test]
  async fn skip_download_builds_in_cwd_and_keeps_it() {
    let project = project();
    let builder = FakeBuilder::new(scenario());
    let mut config = config(project.path());
    config.skip_download = true;

    run_pipeline(&builder, &config).await.unwrap();

    let cwd = dunce::canonicalize(project.path()).unwrap();
    assert_eq!(builder.work_path(), cwd);
    assert!(cwd.join("package.json").exists());
    assert!(cwd.join(BUILD_ID_PATH).exists());
  }

  #[tokio::test]
  async fn build_failure_writes_nothing() {
    let temp = TempDir::new().unwrap();
    // No package.json, so the entry point is missing.
    let builder = FakeBuilder::new(scenario());

    let err = run_pipeline(&builder, &config(temp.path())).await.unwrap_err();

    assert!(matches!(err, PipelineError::Build(BuildError::MissingEntrypoint(_))));
    assert_eq!(err.stage(), Stage::WorkspaceReady);
    let out_dir = temp.path().join(OUTPUT_DIR_NAME);
    assert!(!out_dir.join(CONFIG_FILE_NAME).exists());
    assert!(!out_dir.join(STATIC_ARCHIVE_NAME).exists());
  }

  #[tokio::test]
  async fn missing_cwd_is_workspace_error() {
    let temp = TempDir::new().unwrap();
    let builder = FakeBuilder::new(scenario());

    let err = run_pipeline(&builder, &config(&temp.path().join("missing")))
      .await
      .unwrap_err();

    assert!(matches!(err, PipelineError::Workspace { .. }));
  }

  #[tokio::test]
  #[traced_test]
  async fn verbose_run_logs_routes() {
    let project = project();
    let builder = FakeBuilder::new(scenario());
    let mut config = config(project.path());
    config.log_level = LogLevel::Verbose;

    run_pipeline(&builder, &config).await.unwrap();

    assert!(logs_contain("resolved routes"));
    assert!(logs_contain(r#"{"src":"/old","dest":"/new"}"#));
  }
}
