//! Shared utilities.
//!
//! Content hashing for artifact reports and path helpers for keys coming out
//! of the framework build.

pub mod hash;
pub mod path;
