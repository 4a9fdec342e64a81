//! Terminal output for the `next-tf` binary.
//!
//! Status lines go to stdout with an optional colored marker; errors go to
//! stderr. Coloring is skipped when the stream does not support it.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream, Style};

/// Shape of the final build report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  /// Human readable summary
  #[default]
  Text,
  /// The full build report as JSON
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PLUS: &str = "+";
}

/// First 12 characters of a hex digest.
pub fn truncate_hash(hash: &str) -> &str {
  hash.get(..12).unwrap_or(hash)
}

pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{bytes} B");
  }

  let mut value = bytes as f64 / 1024.0;
  let mut unit = UNITS[0];
  for next in &UNITS[1..] {
    if value < 1024.0 {
      break;
    }
    value /= 1024.0;
    unit = next;
  }
  format!("{value:.1} {unit}")
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match secs {
    0 => format!("{}ms", duration.subsec_millis()),
    1..60 => format!("{:.2}s", duration.as_secs_f64()),
    _ => format!("{}m {}s", secs / 60, secs % 60),
  }
}

/// Print `marker message` to stdout, styling only the marker.
fn print_marked(marker: &str, style: Style, message: &str) {
  println!(
    "{} {message}",
    marker.if_supports_color(Stream::Stdout, |s| s.style(style))
  );
}

pub fn print_success(message: &str) {
  print_marked(symbols::SUCCESS, Style::new().green(), message);
}

pub fn print_info(message: &str) {
  print_marked(symbols::INFO, Style::new().blue(), message);
}

/// Print an error line to stderr, marker and message both in red.
pub fn print_error(message: &str) {
  let style = Style::new().red();
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.style(style)),
    message.if_supports_color(Stream::Stderr, |s| s.style(style))
  );
}

/// Indented `label: value` line with a dimmed label.
pub fn print_stat(label: &str, value: &str) {
  let dimmed = Style::new().dimmed();
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.style(dimmed)));
}

/// One lambda of the report: `+ /route → lambdas/key.zip (size)`.
pub fn print_lambda(route: &str, filename: &str, size: u64) {
  println!(
    "    {} {route} {} {filename} ({})",
    symbols::PLUS.if_supports_color(Stream::Stdout, |s| s.style(Style::new().green())),
    symbols::ARROW,
    format_bytes(size)
  );
}

/// Pretty JSON of `value` on stdout, newline terminated.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let mut stdout = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut stdout, value).context("Failed to serialize report")?;
  writeln!(stdout).context("Failed to write report")?;
  Ok(())
}
