//! Preflight checks for kernel builds.
//!
//! Validates that the host and the source tree have what a build needs
//! before anything expensive runs: host tools, the installer submodule,
//! and the toolchain directory.
//!
//! # Example
//!
//! ```rust
//! use grass_builder::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("make") {
//!     println!("make not installed");
//! }
//!
//! let tools = &[("make", "make"), ("git", "git")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use std::path::Path;

use crate::error::{BuildError, Result};
use crate::process::{Cmd, ProcessRunner};

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Check that specific tools are available.
///
/// # Arguments
///
/// * `tools` - Slice of (command, package) tuples
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` listing every missing tool and its package
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(BuildError::MissingDependency(format!(
            "missing required host tools:\n{}",
            msg
        )));
    }

    Ok(())
}

/// Report whether `path` exists, printing the result.
pub fn check_file(path: &Path) -> bool {
    print!("  Checking file if exists: {}... ", path.display());
    let found = path.exists();
    println!("{}", if found { "Found" } else { "Not found" });
    found
}

/// Make sure the installer submodule is checked out.
///
/// Runs `<git> submodule update --init` once if `marker` is absent; the
/// marker must exist afterwards.
pub fn ensure_submodules(
    runner: &ProcessRunner,
    git: &str,
    source_root: &Path,
    marker: &Path,
) -> Result<()> {
    if check_file(marker) {
        return Ok(());
    }

    check_required_tools(&[(git, "git")])?;
    println!("Fetching submodules...");
    runner.run(
        &Cmd::new(git)
            .args(["submodule", "update", "--init"])
            .current_dir(source_root),
    )?;

    if !marker.exists() {
        return Err(BuildError::MissingDependency(format!(
            "submodule update finished but {} is still missing",
            marker.display()
        )));
    }
    Ok(())
}

/// The toolchain directory must be provided by the operator.
pub fn require_toolchain_dir(dir: &Path) -> Result<()> {
    if check_file(dir) {
        return Ok(());
    }
    Err(BuildError::MissingDependency(format!(
        "Please make toolchain available at {}",
        dir.display()
    )))
}
