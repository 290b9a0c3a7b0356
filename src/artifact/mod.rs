//! Flashable artifact assembly.
//!
//! - [`manifest`] - The fixed list of installer files that go into the zip
//! - [`archive`] - Zip creation and relocation into the working directory
//!
//! The archive is named `GrassKernel_<target>_<variant>_<date>.zip` and holds
//! the staged kernel image plus the installer scaffolding from the packaging
//! submodule.

pub mod archive;
pub mod manifest;

use std::path::PathBuf;
use std::time::Duration;

pub use archive::{archive_name, package};
pub use manifest::ArchiveManifest;

/// Terminal output of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub archive_path: PathBuf,
    pub kernel_version: String,
    /// Wall-clock time spent configuring and compiling.
    pub elapsed: Duration,
}

/// `<m>m <s>s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
