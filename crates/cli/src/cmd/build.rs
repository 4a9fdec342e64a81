//! Implementation of the `next-tf build` command.
//!
//! Runs the framework build through a shell command, then writes the
//! deployment bundle to `<cwd>/.next-tf/`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;

use nexttf_lib::build::CommandBuilder;
use nexttf_lib::consts::{DEFAULT_ENTRYPOINT, STATIC_ARCHIVE_NAME};
use nexttf_lib::pipeline::{BuildReport, LogLevel, PipelineConfig, run_pipeline};

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_json, print_lambda, print_stat, print_success,
  truncate_hash,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
  /// Also log the resolved route list and debug output
  Verbose,
  #[default]
  None,
}

impl From<LogLevelArg> for LogLevel {
  fn from(level: LogLevelArg) -> Self {
    match level {
      LogLevelArg::Verbose => LogLevel::Verbose,
      LogLevelArg::None => LogLevel::None,
    }
  }
}

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Shell command running the framework build; it must write the build
  /// document to $NEXTTF_BUILD_OUTPUT
  #[arg(long, env = "NEXTTF_BUILD_COMMAND")]
  pub build_command: String,

  /// Project directory holding the sources and receiving .next-tf/
  #[arg(long, env = "NEXTTF_CWD", default_value = ".")]
  pub cwd: PathBuf,

  /// Build in the project directory instead of a temporary copy
  #[arg(long, env = "NEXTTF_SKIP_DOWNLOAD")]
  pub skip_download: bool,

  /// Keep the temporary build workspace after the run
  #[arg(long)]
  pub keep_build_cache: bool,

  /// Log verbosity
  #[arg(long, value_enum, env = "NEXTTF_LOG_LEVEL", default_value_t = LogLevelArg::None)]
  pub log_level: LogLevelArg,

  /// Entry point file passed to the build
  #[arg(long, default_value = DEFAULT_ENTRYPOINT)]
  pub entrypoint: String,

  /// Shell used to run the build command
  #[arg(long)]
  pub shell: Option<String>,

  /// Report format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,
}

impl BuildArgs {
  pub fn is_verbose(&self) -> bool {
    self.log_level == LogLevelArg::Verbose
  }

  fn pipeline_config(&self) -> PipelineConfig {
    PipelineConfig {
      cwd: self.cwd.clone(),
      skip_download: self.skip_download,
      delete_build_cache: !self.keep_build_cache,
      log_level: self.log_level.into(),
      entrypoint: self.entrypoint.clone(),
    }
  }

  fn builder(&self) -> CommandBuilder {
    let builder = CommandBuilder::new(&self.build_command);
    match &self.shell {
      Some(shell) => builder.with_shell(shell),
      None => builder,
    }
  }
}

/// Execute the build command.
///
/// Drives the pipeline on a single-threaded runtime and prints a summary of
/// the written bundle. Any pipeline failure is returned as an error, which
/// `main` turns into a non-zero exit code.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let config = args.pipeline_config();
  let builder = args.builder();
  debug!(?config, command = %builder.command, "build configuration");

  let started = Instant::now();
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;
  let report = rt
    .block_on(run_pipeline(&builder, &config))
    .context("Build failed")?;

  if args.format.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report, started.elapsed());
  }

  Ok(())
}

fn print_report(report: &BuildReport, elapsed: Duration) {
  let manifest = &report.manifest;

  print_success(&format!("Deployment bundle written to {}", report.output_dir.display()));
  print_stat("Build ID", manifest.build_id.trim());
  println!();

  print_stat("Lambdas", &report.lambdas.len().to_string());
  for (key, entry) in &manifest.lambdas {
    let size = report.lambdas.get(key).map_or(0, |artifact| artifact.size);
    print_lambda(&entry.route, &entry.filename, size);
  }

  let bundle = &report.static_bundle;
  print_stat("Static files", &bundle.entries.to_string());
  print_stat("Static routes", &manifest.static_routes.len().to_string());
  print_stat(
    "Static bundle",
    &format!(
      "{} ({}, sha256 {})",
      STATIC_ARCHIVE_NAME,
      format_bytes(bundle.size),
      truncate_hash(&bundle.sha256.0)
    ),
  );
  print_stat("Routes", &manifest.routes.len().to_string());
  println!();

  print_info(&format!("Finished in {}", format_duration(elapsed)));
}
