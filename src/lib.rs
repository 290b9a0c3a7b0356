//! Build orchestration for the Grass kernel.
//!
//! This crate wraps the kernel tree's native build and turns its output into
//! a flashable installer zip for a fixed set of devices:
//!
//! - **Process runner** - Blocking external commands with failure logs
//! - **Preflight checks** - Host tools, installer submodule, toolchain directory
//! - **Toolchain probe** - Compiler presence and version banner
//! - **Fragment composition** - Ordered configuration fragments per request
//! - **Orchestrator** - Configure, compile, extract version, stage, package
//! - **Archiver** - `GrassKernel_<target>_<variant>_<date>.zip`
//!
//! # Architecture
//!
//! ```text
//! grass-builder (bin)
//!     │
//!     ├── request::BuildRequest ── validated CLI input
//!     ├── settings::Settings ───── grass-build.toml + defaults
//!     │
//!     └── build::Orchestrator
//!             ├── preflight / toolchain ── process::ProcessRunner
//!             ├── build::fragments ─────── vendor/*.config list
//!             ├── build::kernel ────────── make O=out LLVM=1 -jN
//!             └── artifact::package ────── zip + relocate
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use grass_builder::{run_build, BuildRequest, Settings};
//!
//! let root = std::env::current_dir()?;
//! let request = BuildRequest::new("a51", false, true, true, false)?;
//! let settings = Settings::load(&root, None)?;
//! let artifact = run_build(&request, &settings, &root, &root)?;
//! println!("{}", artifact.archive_path.display());
//! ```

pub mod artifact;
pub mod build;
pub mod error;
pub mod extract;
pub mod preflight;
pub mod process;
pub mod request;
pub mod settings;
pub mod toolchain;

pub use artifact::{ArchiveManifest, BuildArtifact};
pub use build::{run_build, BuildState, Orchestrator};
pub use error::{BuildError, Result};
pub use request::{BuildRequest, Target, Variant};
pub use settings::Settings;
