//! Fixed names and locations shared across the pipeline.

/// Output directory, relative to the caller's working directory.
pub const OUTPUT_DIR_NAME: &str = ".next-tf";

/// Manifest file name inside the output directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Static bundle file name inside the output directory.
pub const STATIC_ARCHIVE_NAME: &str = "static-website-files.zip";

/// Directory holding one archive per lambda.
pub const LAMBDAS_DIR_NAME: &str = "lambdas";

/// Static keys under this prefix are served by the CDN directly and never get
/// a proxy route.
pub const CDN_DIRECT_PREFIX: &str = "_next/static/";

/// Build identifier written by the framework build, relative to the workspace.
pub const BUILD_ID_PATH: &str = ".next/BUILD_ID";

pub const DEFAULT_ENTRYPOINT: &str = "package.json";

/// File the external build command writes its result document to.
pub const BUILD_OUTPUT_FILE_NAME: &str = ".next-tf-build.json";

/// Directory names never treated as build sources.
pub const IGNORED_SOURCE_DIRS: &[&str] = &["node_modules", ".next", OUTPUT_DIR_NAME, ".git"];

/// Prefix for temporary build workspaces.
pub const WORKSPACE_PREFIX: &str = "next-tf-";

/// Extension appended to files while they are still being written.
pub const PARTIAL_EXTENSION: &str = "partial";
