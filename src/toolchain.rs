//! Toolchain probing.
//!
//! Runs the compiler once with `-v` before any build work starts, so a broken
//! or absent toolchain fails in seconds instead of minutes into a build.

use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::extract::{compile, extract_first_group, CLANG_VERSION_PATTERN};
use crate::process::{Cmd, ProcessRunner};

pub const COMPILER_NAME: &str = "clang";

/// A verified compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    pub executable_path: PathBuf,
    /// Leading banner clause, e.g. `clang version 14.0.6`.
    pub version_string: String,
}

impl ToolchainInfo {
    /// Directory holding the compiler, handed to children via `PATH`.
    pub fn bin_dir(&self) -> &Path {
        self.executable_path.parent().unwrap_or(Path::new("."))
    }
}

/// Confirm `<toolchain_bin_dir>/clang` runs and read its version banner.
///
/// A failing invocation is returned as-is; it is not retried.
pub fn verify(runner: &ProcessRunner, toolchain_bin_dir: &Path) -> Result<ToolchainInfo> {
    let executable_path = toolchain_bin_dir.join(COMPILER_NAME);
    if !executable_path.is_file() {
        return Err(BuildError::MissingDependency(format!(
            "compiler not found at {}",
            executable_path.display()
        )));
    }

    let result = runner.run(&Cmd::new(&executable_path).arg("-v")).map_err(|e| {
        eprintln!("Failed to execute {}, something went wrong", COMPILER_NAME);
        e
    })?;

    // clang prints its banner on stderr
    let banner = result.combined_output();
    let version_string = extract_first_group(&compile(CLANG_VERSION_PATTERN)?, &banner)?;
    tracing::info!(compiler = %executable_path.display(), version = %version_string, "toolchain verified");

    Ok(ToolchainInfo {
        executable_path,
        version_string,
    })
}
