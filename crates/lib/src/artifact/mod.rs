//! Artifact writers.
//!
//! Two independent writers produce the files the manifest refers to:
//!
//! - [`lambdas`] - one archive per lambda under `lambdas/`
//! - [`static_bundle`] - a single zip of every static file
//!
//! Neither writer depends on the other, so the pipeline runs them
//! concurrently and only writes the manifest once both have returned.

pub mod lambdas;
pub mod static_bundle;
mod types;

pub use lambdas::{lambda_filename, write_lambdas};
pub use static_bundle::write_static_bundle;
pub use types::*;
