//! Builder settings.
//!
//! All settings have defaults matching the layout of the kernel tree. A
//! `grass-build.toml` in the source root (or a file passed explicitly)
//! overrides them:
//!
//! ```toml
//! toolchain_dir = "/opt/clang-r450784e"
//! jobs = 8
//! verbose = true
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::manifest::ArchiveManifest;
use crate::error::{BuildError, IoContext, Result};

/// File looked up in the source root when no explicit path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "grass-build.toml";

const FALLBACK_JOBS: usize = 4;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub toolchain_dir: PathBuf,
    pub out_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub submodule_marker: PathBuf,
    pub make: String,
    pub git: String,
    pub arch: String,
    /// Relative to `out_dir`.
    pub kernel_image: PathBuf,
    pub staged_image_name: String,
    /// Relative to `out_dir`.
    pub version_header: PathBuf,
    pub jobs: Option<usize>,
    pub verbose: bool,
    pub manifest: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toolchain_dir: PathBuf::from("toolchain"),
            out_dir: PathBuf::from("out"),
            staging_dir: PathBuf::from("scripts/packaging"),
            submodule_marker: PathBuf::from("scripts/packaging/pack.sh"),
            make: "make".to_string(),
            git: "git".to_string(),
            arch: "arm64".to_string(),
            kernel_image: PathBuf::from("arch/arm64/boot/Image"),
            staged_image_name: "Image".to_string(),
            version_header: PathBuf::from("include/generated/utsrelease.h"),
            jobs: None,
            verbose: false,
            manifest: None,
        }
    }
}

impl Settings {
    /// Load settings for `source_root`.
    ///
    /// With `explicit` set the file must exist. Otherwise
    /// [`DEFAULT_SETTINGS_FILE`] is read if present and defaults are used if not.
    pub fn load(source_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                let path = resolve(source_root, path);
                if !path.is_file() {
                    return Err(BuildError::MissingDependency(format!(
                        "settings file not found: {}",
                        path.display()
                    )));
                }
                path
            }
            None => {
                let path = source_root.join(DEFAULT_SETTINGS_FILE);
                if !path.is_file() {
                    tracing::debug!(path = %path.display(), "no settings file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .io_context(|| format!("reading settings '{}'", path.display()))?;
        Self::parse(&content, &path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| BuildError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parallelism for the native build.
    pub fn jobs(&self) -> usize {
        if let Some(jobs) = self.jobs.filter(|&j| j > 0) {
            return jobs;
        }
        match std::thread::available_parallelism() {
            Ok(n) => n.get(),
            Err(e) => {
                tracing::warn!("could not detect CPU count ({}), using {} jobs", e, FALLBACK_JOBS);
                FALLBACK_JOBS
            }
        }
    }

    pub fn manifest(&self) -> ArchiveManifest {
        match &self.manifest {
            Some(entries) => ArchiveManifest::new(entries.iter().map(PathBuf::from)),
            None => ArchiveManifest::anykernel(&self.staged_image_name),
        }
    }

    pub fn toolchain_bin_dir(&self, source_root: &Path) -> PathBuf {
        resolve(source_root, &self.toolchain_dir).join("bin")
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
