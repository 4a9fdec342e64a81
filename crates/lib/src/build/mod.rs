//! Framework build invocation.
//!
//! The framework build itself is an external collaborator: it receives the
//! enumerated source files, an entry point and a work path, and returns a
//! [`BuildResult`](crate::output::BuildResult). This module defines that
//! capability and the default command-driven implementation.
//!
//! # Submodules
//!
//! - [`command`] - runs a shell command and loads the build document it writes
//! - [`sources`] - source enumeration and workspace population

pub mod command;
pub mod sources;
mod types;

pub use command::CommandBuilder;
pub use types::*;
