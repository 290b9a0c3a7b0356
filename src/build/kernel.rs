//! Native kernel build invocations.
//!
//! The kernel tree's own make-based build does the real work. This module
//! only shapes its command lines, reads back the release string it
//! generates, and stages the resulting image for packaging.
//!
//! # Usage
//!
//! ```rust,ignore
//! use grass_builder::build::kernel::{KernelMake, generate_config, build_kernel};
//!
//! let make = KernelMake::from_settings(&settings, &source_root);
//! generate_config(&runner, &make, &fragments)?;
//! build_kernel(&runner, &make)?;
//! let version = get_kernel_version(make.out_dir(), &settings.version_header)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::fragments::ConfigFragmentList;
use crate::error::{BuildError, IoContext, Result};
use crate::extract::{compile, extract_first_group, UTS_RELEASE_PATTERN};
use crate::process::{Cmd, ProcessRunner};
use crate::settings::{resolve, Settings};

/// Shared shape of every make invocation against the kernel tree.
#[derive(Debug, Clone)]
pub struct KernelMake {
    program: String,
    source_root: PathBuf,
    out_dir: PathBuf,
    arch: String,
    jobs: usize,
}

impl KernelMake {
    pub fn new(
        program: impl Into<String>,
        source_root: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        arch: impl Into<String>,
        jobs: usize,
    ) -> Self {
        Self {
            program: program.into(),
            source_root: source_root.into(),
            out_dir: out_dir.into(),
            arch: arch.into(),
            jobs: jobs.max(1),
        }
    }

    pub fn from_settings(settings: &Settings, source_root: &Path) -> Self {
        Self::new(
            settings.make.clone(),
            source_root,
            resolve(source_root, &settings.out_dir),
            settings.arch.clone(),
            settings.jobs(),
        )
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// `make -C <src> O=<out> ARCH=<arch> LLVM=1 -j<n>`
    pub fn common(&self) -> Cmd {
        Cmd::new(&self.program)
            .arg("-C")
            .arg_path(&self.source_root)
            .arg(format!("O={}", self.out_dir.display()))
            .arg(format!("ARCH={}", self.arch))
            .arg("LLVM=1")
            .arg(format!("-j{}", self.jobs))
    }

    pub fn defconfig(&self, fragments: &ConfigFragmentList) -> Cmd {
        self.common().args(fragments.iter())
    }

    pub fn build(&self) -> Cmd {
        self.common()
    }
}

/// Remove a previous output tree so objects from another target or variant
/// cannot leak into this build.
pub fn clean_output(out_dir: &Path) -> Result<()> {
    if out_dir.exists() {
        println!("Make clean...");
        fs::remove_dir_all(out_dir)
            .io_context(|| format!("removing output directory '{}'", out_dir.display()))?;
    }
    Ok(())
}

/// Merge the configuration fragments into `<out>/.config`.
pub fn generate_config(
    runner: &ProcessRunner,
    make: &KernelMake,
    fragments: &ConfigFragmentList,
) -> Result<()> {
    println!("Make defconfig...");
    runner.run(&make.defconfig(fragments))?;
    Ok(())
}

/// Compile the kernel image.
pub fn build_kernel(runner: &ProcessRunner, make: &KernelMake) -> Result<()> {
    println!("Make kernel...");
    runner.run(&make.build())?;
    Ok(())
}

/// Read the release string from the generated header under `out_dir`.
pub fn get_kernel_version(out_dir: &Path, version_header: &Path) -> Result<String> {
    let header = out_dir.join(version_header);
    if !header.is_file() {
        return Err(BuildError::PatternMatch {
            pattern: UTS_RELEASE_PATTERN.to_string(),
            text: format!("<header not found: {}>", header.display()),
        });
    }
    let content = fs::read_to_string(&header)
        .io_context(|| format!("reading '{}'", header.display()))?;
    extract_first_group(&compile(UTS_RELEASE_PATTERN)?, &content)
}

/// Copy the compiled image into the staging directory under `staged_name`.
pub fn stage_image(
    out_dir: &Path,
    kernel_image: &Path,
    staging_dir: &Path,
    staged_name: &str,
) -> Result<PathBuf> {
    let image = out_dir.join(kernel_image);
    if !image.is_file() {
        return Err(BuildError::MissingAsset { path: image });
    }

    let dest = staging_dir.join(staged_name);
    fs::copy(&image, &dest)
        .io_context(|| format!("copying '{}' -> '{}'", image.display(), dest.display()))?;
    println!("  Staged {}", dest.display());

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::fragments::compose;
    use crate::request::{BuildRequest, Target, Variant};
    use tempfile::TempDir;

    fn make() -> KernelMake {
        KernelMake::new("make", "/src/grass", "/src/grass/out", "arm64", 8)
    }

    #[test]
    fn test_common_arguments() {
        assert_eq!(
            make().common().to_string(),
            "make -C /src/grass O=/src/grass/out ARCH=arm64 LLVM=1 -j8"
        );
    }

    #[test]
    fn test_defconfig_appends_fragments_in_order() {
        let request = BuildRequest {
            target: Target::M31,
            variant: Variant::OneUi,
            include_root_support: true,
            allow_dirty_output: false,
        };
        let cmd = make().defconfig(&compose(&request));
        assert_eq!(
            cmd.to_string(),
            "make -C /src/grass O=/src/grass/out ARCH=arm64 LLVM=1 -j8 \
             vendor/m31_defconfig vendor/grass.config vendor/m31.config vendor/ksu.config"
        );
    }

    #[test]
    fn test_jobs_never_zero() {
        let make = KernelMake::new("make", ".", "out", "arm64", 0);
        assert_eq!(make.jobs(), 1);
    }

    #[test]
    fn test_from_settings_resolves_out_dir() {
        let settings = Settings {
            jobs: Some(2),
            ..Settings::default()
        };
        let make = KernelMake::from_settings(&settings, Path::new("/k"));
        assert_eq!(make.out_dir(), Path::new("/k/out"));
        assert_eq!(make.jobs(), 2);
    }

    #[test]
    fn test_clean_output() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("arch/arm64")).unwrap();
        fs::write(out.join("vmlinux.o"), b"stale").unwrap();

        clean_output(&out).unwrap();
        assert!(!out.exists());
        // Absent directory is fine
        clean_output(&out).unwrap();
    }

    #[test]
    fn test_get_kernel_version() {
        let temp = TempDir::new().unwrap();
        let header = temp.path().join("include/generated/utsrelease.h");
        fs::create_dir_all(header.parent().unwrap()).unwrap();
        fs::write(&header, "#define UTS_RELEASE \"4.14.113-Grass-v3\"\n").unwrap();

        let version =
            get_kernel_version(temp.path(), Path::new("include/generated/utsrelease.h")).unwrap();
        assert_eq!(version, "4.14.113-Grass-v3");
    }

    #[test]
    fn test_get_kernel_version_malformed_header() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("utsrelease.h"), "garbage\n").unwrap();

        let err = get_kernel_version(temp.path(), Path::new("utsrelease.h")).unwrap_err();
        assert!(matches!(err, BuildError::PatternMatch { .. }));
    }

    #[test]
    fn test_get_kernel_version_missing_header() {
        let temp = TempDir::new().unwrap();

        let err = get_kernel_version(temp.path(), Path::new("include/generated/utsrelease.h"))
            .unwrap_err();
        match err {
            BuildError::PatternMatch { pattern, text } => {
                assert_eq!(pattern, UTS_RELEASE_PATTERN);
                assert!(text.starts_with("<header not found: "));
                assert!(text.contains("include/generated/utsrelease.h"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stage_image() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let staging = temp.path().join("staging");
        fs::create_dir_all(out.join("arch/arm64/boot")).unwrap();
        fs::create_dir_all(&staging).unwrap();
        fs::write(out.join("arch/arm64/boot/Image"), b"kernel-bytes").unwrap();

        let staged =
            stage_image(&out, Path::new("arch/arm64/boot/Image"), &staging, "Image").unwrap();
        assert_eq!(staged, staging.join("Image"));
        assert_eq!(fs::read(&staged).unwrap(), b"kernel-bytes");
    }

    #[test]
    fn test_stage_image_missing() {
        let temp = TempDir::new().unwrap();
        let err = stage_image(temp.path(), Path::new("Image"), temp.path(), "Image").unwrap_err();
        assert!(matches!(err, BuildError::MissingAsset { .. }));
    }
}
