//! Routing rules and route path normalization.
//!
//! Routes are produced by the framework build and passed through to the
//! manifest untouched. The proxy matches them in sequence, so their order is
//! part of their meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single routing rule as understood by the edge proxy.
///
/// The rule is kept as the raw JSON object the build emitted. Field values are
/// not validated or normalized, so explicit `null`s and unusual value types
/// reach the manifest unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(pub Map<String, Value>);

impl Route {
  /// A rule sending requests matching `src` to `dest`.
  pub fn rewrite(src: &str, dest: &str) -> Self {
    let mut fields = Map::new();
    fields.insert("src".to_string(), Value::from(src));
    fields.insert("dest".to_string(), Value::from(dest));
    Self(fields)
  }

  /// A phase marker rule such as `{ "handle": "filesystem" }`.
  pub fn handle(phase: &str) -> Self {
    let mut fields = Map::new();
    fields.insert("handle".to_string(), Value::from(phase));
    Self(fields)
  }

  pub fn src(&self) -> Option<&str> {
    self.str_field("src")
  }

  pub fn dest(&self) -> Option<&str> {
    self.str_field("dest")
  }

  /// Routing phase marker (e.g. `filesystem`).
  pub fn phase(&self) -> Option<&str> {
    self.str_field("handle")
  }

  fn str_field(&self, name: &str) -> Option<&str> {
    self.0.get(name).and_then(Value::as_str)
  }
}

/// Collapse an index route onto its directory root.
///
/// Exactly one trailing `/index` segment is replaced by `/`:
/// `/index` becomes `/`, `/blog/index` becomes `/blog/`. Every other path is
/// returned unchanged.
pub fn normalize_route(path: &str) -> String {
  match path.strip_suffix("/index") {
    Some(dir) => format!("{dir}/"),
    None => path.to_string(),
  }
}

/// Route path served by the lambda stored under `key`.
pub fn lambda_route(key: &str) -> String {
  normalize_route(&format!("/{key}"))
}

/// Route path served by the static file stored under `key`.
///
/// Static keys are never normalized: `index.html` stays `/index.html`.
pub fn static_route(key: &str) -> String {
  format!("/{key}")
}
