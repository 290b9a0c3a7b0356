//! Installer archive manifest.

use std::path::{Component, Path, PathBuf};

use crate::error::{BuildError, Result};

/// Installer scaffolding shipped by the packaging submodule, after the kernel image.
const ANYKERNEL_ASSETS: &[&str] = &[
    "anykernel.sh",
    "META-INF/com/google/android/update-binary",
    "META-INF/com/google/android/updater-script",
    "tools/ak3-core.sh",
    "tools/busybox",
    "tools/magiskboot",
];

/// Ordered relative paths that must exist under the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManifest {
    entries: Vec<PathBuf>,
}

impl ArchiveManifest {
    pub fn new(entries: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Kernel image followed by the AnyKernel installer files.
    pub fn anykernel(image_name: &str) -> Self {
        Self::new(
            std::iter::once(image_name)
                .chain(ANYKERNEL_ASSETS.iter().copied())
                .map(PathBuf::from),
        )
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Check every entry is a plain relative path present under `staging_dir`.
    ///
    /// Fails on the first missing entry, naming it.
    pub fn verify(&self, staging_dir: &Path) -> Result<()> {
        for entry in &self.entries {
            if !is_plain_relative(entry) {
                return Err(BuildError::InvalidRequest(format!(
                    "manifest entry must be relative and stay inside staging: {}",
                    entry.display()
                )));
            }
            let path = staging_dir.join(entry);
            if !path.is_file() {
                return Err(BuildError::MissingAsset { path });
            }
        }
        Ok(())
    }
}

/// Archive member name: components joined with `/`.
pub fn entry_name(entry: &Path) -> String {
    entry
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_plain_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
