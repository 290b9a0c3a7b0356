use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use grass_builder::artifact::format_elapsed;
use grass_builder::{BuildRequest, Orchestrator, Settings};
use tracing::Level;

/// Build Grass Kernel with specified arguments
#[derive(Debug, Parser)]
#[command(name = "grass-builder", version)]
struct Cli {
    /// Target device (a51/f41/m31s/m31/m21)
    #[arg(long)]
    target: String,

    /// OneUI variant
    #[arg(long)]
    oneui: bool,

    /// AOSP variant
    #[arg(long)]
    aosp: bool,

    /// Don't include KernelSU support in kernel
    #[arg(long)]
    no_ksu: bool,

    /// Reuse the existing output directory instead of cleaning it
    #[arg(long)]
    dirty: bool,

    /// Echo every external command and its outcome
    #[arg(long, short)]
    verbose: bool,

    /// Settings file (default: grass-build.toml in the source root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kernel source tree (default: current directory)
    #[arg(long)]
    source_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let request = BuildRequest::new(&cli.target, cli.oneui, cli.aosp, !cli.no_ksu, cli.dirty)?;

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let source_root = match &cli.source_root {
        Some(root) => root
            .canonicalize()
            .with_context(|| format!("resolving source root '{}'", root.display()))?,
        None => cwd.clone(),
    };

    let mut settings = Settings::load(&source_root, cli.config.as_deref())
        .with_context(|| format!("loading settings for '{}'", source_root.display()))?;
    settings.verbose |= cli.verbose;
    init_tracing(settings.verbose);

    let mut orchestrator = Orchestrator::new(&request, &settings, &source_root, &cwd);
    let artifact = match orchestrator.run() {
        Ok(artifact) => artifact,
        Err(e) => {
            let step = orchestrator
                .failed_step()
                .map(|s| s.step_name())
                .unwrap_or("build");
            return Err(e).with_context(|| {
                format!("building {} ({}) failed during {}", request.target, request.variant, step)
            });
        }
    };

    println!("================================");
    println!("Kernel version: {}", artifact.kernel_version);
    println!("Build time: {}", format_elapsed(artifact.elapsed));
    println!("Archive: {}", artifact.archive_path.display());
    println!("Done");

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
