//! Kernel build orchestration.
//!
//! This module provides:
//! - [`fragments`] - Configuration fragment composition
//! - [`kernel`] - Native build invocations and image staging
//!
//! [`Orchestrator`] drives one build through a fixed sequence of steps. Any
//! failure stops the sequence; there is no resume, a failed build is rerun
//! from the start.
//!
//! ```text
//! Init -> SubmodulesEnsured -> ToolchainVerified -> OutputCleaned
//!      -> ConfigGenerated -> Compiled -> VersionExtracted
//!      -> ArtifactStaged -> Packaged -> Done
//! ```

pub mod fragments;
pub mod kernel;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use time::OffsetDateTime;

use crate::artifact::{self, format_elapsed, BuildArtifact};
use crate::error::Result;
use crate::preflight::{check_required_tools, ensure_submodules, require_toolchain_dir};
use crate::process::ProcessRunner;
use crate::request::BuildRequest;
use crate::settings::{resolve, Settings};
use crate::toolchain::{self, ToolchainInfo};

use self::kernel::KernelMake;

/// Steps of a build, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    Init,
    SubmodulesEnsured,
    ToolchainVerified,
    OutputCleaned,
    ConfigGenerated,
    Compiled,
    VersionExtracted,
    ArtifactStaged,
    Packaged,
    Done,
}

impl BuildState {
    pub fn next(self) -> Option<BuildState> {
        use BuildState::*;
        match self {
            Init => Some(SubmodulesEnsured),
            SubmodulesEnsured => Some(ToolchainVerified),
            ToolchainVerified => Some(OutputCleaned),
            OutputCleaned => Some(ConfigGenerated),
            ConfigGenerated => Some(Compiled),
            Compiled => Some(VersionExtracted),
            VersionExtracted => Some(ArtifactStaged),
            ArtifactStaged => Some(Packaged),
            Packaged => Some(Done),
            Done => None,
        }
    }

    /// Human-readable name of the step that leads into this state.
    pub fn step_name(self) -> &'static str {
        match self {
            BuildState::Init => "initialization",
            BuildState::SubmodulesEnsured => "submodule check",
            BuildState::ToolchainVerified => "toolchain verification",
            BuildState::OutputCleaned => "output cleanup",
            BuildState::ConfigGenerated => "kernel configuration",
            BuildState::Compiled => "kernel compilation",
            BuildState::VersionExtracted => "version extraction",
            BuildState::ArtifactStaged => "image staging",
            BuildState::Packaged => "packaging",
            BuildState::Done => "completion",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Runs one build request against one kernel tree.
pub struct Orchestrator<'a> {
    request: &'a BuildRequest,
    settings: &'a Settings,
    source_root: PathBuf,
    dest_dir: PathBuf,
    state: BuildState,
}

impl<'a> Orchestrator<'a> {
    /// `source_root` is the kernel tree; `dest_dir` receives the archive and
    /// any failure logs.
    pub fn new(
        request: &'a BuildRequest,
        settings: &'a Settings,
        source_root: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            request,
            settings,
            source_root: source_root.into(),
            dest_dir: dest_dir.into(),
            state: BuildState::Init,
        }
    }

    /// Last state reached.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// The step that was running when the build stopped, if it did not finish.
    pub fn failed_step(&self) -> Option<BuildState> {
        self.state.next()
    }

    pub fn run(&mut self) -> Result<BuildArtifact> {
        let settings = self.settings;
        let request = self.request;
        let root = self.source_root.clone();
        let runner = ProcessRunner::new(&self.dest_dir).verbose(settings.verbose);

        check_required_tools(&[(settings.make.as_str(), "make")])?;
        ensure_submodules(
            &runner,
            &settings.git,
            &root,
            &resolve(&root, &settings.submodule_marker),
        )?;
        self.advance(BuildState::SubmodulesEnsured);

        require_toolchain_dir(&resolve(&root, &settings.toolchain_dir))?;
        let tc = toolchain::verify(&runner, &settings.toolchain_bin_dir(&root))?;
        self.advance(BuildState::ToolchainVerified);
        print_build_info(request, &tc);

        let runner = runner.with_search_path(tc.bin_dir());
        let make = KernelMake::from_settings(settings, &root);
        if request.allow_dirty_output {
            println!("Reusing output directory {}", make.out_dir().display());
        } else {
            kernel::clean_output(make.out_dir())?;
        }
        self.advance(BuildState::OutputCleaned);

        let fragments = fragments::compose(request);
        let started = Instant::now();
        kernel::generate_config(&runner, &make, &fragments)?;
        self.advance(BuildState::ConfigGenerated);

        kernel::build_kernel(&runner, &make)?;
        let elapsed = started.elapsed();
        self.advance(BuildState::Compiled);
        println!("Build took {}", format_elapsed(elapsed));

        let kernel_version = kernel::get_kernel_version(make.out_dir(), &settings.version_header)?;
        self.advance(BuildState::VersionExtracted);

        let staging_dir = resolve(&root, &settings.staging_dir);
        kernel::stage_image(
            make.out_dir(),
            &settings.kernel_image,
            &staging_dir,
            &settings.staged_image_name,
        )?;
        self.advance(BuildState::ArtifactStaged);

        println!("Packaging...");
        let archive_path = artifact::package(
            &staging_dir,
            &settings.manifest(),
            request.target,
            request.variant,
            OffsetDateTime::now_utc().date(),
            &self.dest_dir,
        )?;
        self.advance(BuildState::Packaged);

        self.advance(BuildState::Done);
        Ok(BuildArtifact {
            archive_path,
            kernel_version,
            elapsed,
        })
    }

    fn advance(&mut self, next: BuildState) {
        debug_assert_eq!(self.state.next(), Some(next));
        tracing::debug!(from = ?self.state, to = ?next, "build state");
        self.state = next;
    }
}

/// Build `request` in `source_root`, writing the archive to `dest_dir`.
pub fn run_build(
    request: &BuildRequest,
    settings: &Settings,
    source_root: &Path,
    dest_dir: &Path,
) -> Result<BuildArtifact> {
    Orchestrator::new(request, settings, source_root, dest_dir).run()
}

fn print_build_info(request: &BuildRequest, tc: &ToolchainInfo) {
    println!("================================");
    println!("TARGET_KERNEL=Grass");
    println!("TARGET_VARIANT={}", request.variant);
    println!("TARGET_DEVICE={}", request.target);
    println!("TARGET_INCLUDES_KSU={}", request.include_root_support);
    println!("TARGET_USES_LLVM=true");
    println!("TOOLCHAIN={}", tc.version_string);
    println!("================================");
}
