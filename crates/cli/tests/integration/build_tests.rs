//! End-to-end tests for `next-tf build`.
//!
//! A small shell script stands in for the framework build: it writes the
//! build id, a page, a lambda payload and the build document into the
//! workspace it runs in.

#![cfg(unix)]

use predicates::prelude::*;
use serde_json::Value;

use super::common::{TestEnv, zip_entry, zip_entry_names};

const BUILD_SCRIPT: &str = r#"set -e
mkdir -p .next/server/pages
printf 'build-42' > .next/BUILD_ID
printf '<h1>About</h1>' > .next/server/pages/about.html
printf 'lambda-payload' > .next/index.zip
cat > "$NEXTTF_BUILD_OUTPUT" <<'JSON'
{
  "routes": [
    { "src": "/old", "dest": "/new", "status": 308 },
    { "handle": "filesystem" }
  ],
  "output": {
    "index": { "type": "Lambda", "handler": "index.handler", "runtime": "nodejs20.x", "zipPath": ".next/index.zip" },
    "about.html": { "type": "FileFsRef", "fsPath": ".next/server/pages/about.html" },
    "_next/static/chunks/main.js": { "type": "FileBlob", "data": "console.log(1)" },
    "blog": { "type": "Prerender", "expiration": 60 }
  }
}
JSON
"#;

const BROKEN_SCRIPT: &str = r#"set -e
mkdir -p .next
printf 'build-42' > .next/BUILD_ID
cat > "$NEXTTF_BUILD_OUTPUT" <<'JSON'
{ "output": { "gone.html": { "type": "FileFsRef", "fsPath": "missing/gone.html" } } }
JSON
"#;

fn project_with_script(script: &str) -> TestEnv {
  let env = TestEnv::project();
  env.write_file("build.sh", script);
  env
}

// =============================================================================
// Successful builds
// =============================================================================

#[test]
fn build_writes_complete_output_directory() {
  let env = project_with_script(BUILD_SCRIPT);

  env
    .build_cmd("sh build.sh")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deployment bundle written"))
    .stdout(predicate::str::contains("build-42"));

  let config: Value = serde_json::from_str(&std::fs::read_to_string(env.output_file("config.json")).unwrap()).unwrap();
  assert_eq!(config["buildId"], "build-42");
  assert_eq!(config["staticFilesArchive"], "static-website-files.zip");
  assert_eq!(config["lambdas"]["index"]["route"], "/");
  assert_eq!(config["lambdas"]["index"]["filename"], "lambdas/index.zip");
  assert_eq!(config["lambdas"]["index"]["handler"], "index.handler");
  assert_eq!(config["staticRoutes"], serde_json::json!(["/about.html"]));
  assert_eq!(config["routes"][0]["status"], 308);
  assert_eq!(config["routes"][1]["handle"], "filesystem");

  assert_eq!(
    std::fs::read_to_string(env.output_file("lambdas/index.zip")).unwrap(),
    "lambda-payload"
  );

  let archive = env.output_file("static-website-files.zip");
  let mut names = zip_entry_names(&archive);
  names.sort();
  assert_eq!(names, vec!["_next/static/chunks/main.js", "about.html"]);
  assert_eq!(zip_entry(&archive, "about.html"), "<h1>About</h1>");
}

#[test]
fn build_leaves_project_sources_untouched_by_default() {
  let env = project_with_script(BUILD_SCRIPT);

  env.build_cmd("sh build.sh").assert().success();

  // The build ran in a temporary copy, so its .next/ stayed there.
  assert!(!env.project_path().join(".next").exists());
}

#[test]
fn skip_download_builds_in_place() {
  let env = project_with_script(BUILD_SCRIPT);

  env.build_cmd("sh build.sh").arg("--skip-download").assert().success();

  assert_eq!(
    std::fs::read_to_string(env.project_path().join(".next/BUILD_ID")).unwrap(),
    "build-42"
  );
  assert!(env.output_file("config.json").exists());
}

#[test]
fn json_format_prints_report() {
  let env = project_with_script(BUILD_SCRIPT);

  let output = env.build_cmd("sh build.sh").args(["--format", "json"]).output().unwrap();

  assert!(output.status.success());
  let report: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["manifest"]["buildId"], "build-42");
  assert_eq!(report["staticBundle"]["entries"], 2);
  assert_eq!(report["lambdas"]["index"]["filename"], "lambdas/index.zip");
}

#[test]
fn verbose_log_level_prints_routes() {
  let env = project_with_script(BUILD_SCRIPT);

  env
    .build_cmd("sh build.sh")
    .args(["--log-level", "verbose"])
    .assert()
    .success()
    .stderr(predicate::str::contains("resolved routes"))
    .stderr(predicate::str::contains("/old"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn unreadable_static_file_fails_without_manifest() {
  let env = project_with_script(BROKEN_SCRIPT);

  env
    .build_cmd("sh build.sh")
    .assert()
    .failure()
    .stderr(predicate::str::contains("gone.html"));

  assert!(!env.output_file("config.json").exists());
  assert!(!env.output_file("static-website-files.zip").exists());
}

#[test]
fn failing_build_command_reports_exit_code() {
  let env = TestEnv::project();

  env
    .build_cmd("exit 3")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Build failed"));

  assert!(!env.output_file("config.json").exists());
}

#[test]
fn missing_entrypoint_fails() {
  let env = TestEnv::empty();
  env.write_file("build.sh", BUILD_SCRIPT);

  env
    .build_cmd("sh build.sh")
    .assert()
    .failure()
    .stderr(predicate::str::contains("package.json"));
}
