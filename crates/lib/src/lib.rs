//! nexttf-lib: output assembly for next-tf
//!
//! This crate turns the result of a framework build into a deployable bundle:
//! - `output`: the tagged build output and its classification into lambdas and static files
//! - `artifact`: writers for lambda archives and the static website bundle
//! - `manifest`: the `config.json` routing manifest read by the edge proxy
//! - `pipeline`: the orchestrator driving workspace, build, artifacts and manifest

pub mod artifact;
pub mod build;
pub mod consts;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod route;
pub mod util;
