//! Error taxonomy for kernel builds.
//!
//! Every failure the builder can hit maps onto one [`BuildError`] variant.
//! Nothing is retried: errors propagate to the binary, which reports them
//! and exits non-zero.

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// User-supplied parameters violate a closed set or mutual exclusion.
    #[error("invalid build request: {0}")]
    InvalidRequest(String),

    /// A local prerequisite (toolchain, installer submodule, host tool) is absent.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A spawned process exited unsuccessfully. Its output was persisted.
    #[error(
        "command failed: `{command}` (exit: {}).\n\
         Check output log files: {}, {}\n\
         Log files written to directory: {}",
        .exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        .stdout_log.display(),
        .stderr_log.display(),
        .log_dir.display()
    )]
    ExternalCommand {
        command: String,
        exit_code: Option<i32>,
        stdout_log: PathBuf,
        stderr_log: PathBuf,
        log_dir: PathBuf,
    },

    /// Expected textual structure was not found.
    #[error("failed to match pattern `{pattern}` against: {text}")]
    PatternMatch { pattern: String, text: String },

    /// An installer asset required for packaging is absent.
    #[error("missing installer asset: {}", .path.display())]
    MissingAsset { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("writing archive '{}': {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("parsing settings '{}': {source}", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Attach a description to `io::Error`s, in the spirit of `anyhow::Context`.
pub trait IoContext<T> {
    fn io_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| BuildError::Io {
            context: f().into(),
            source,
        })
    }
}
