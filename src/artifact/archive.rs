//! Flashable zip creation.
//!
//! The archive is assembled inside the staging directory from the manifest,
//! then moved into the destination directory, replacing any earlier archive
//! with the same name.

use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use time::Date;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::manifest::{entry_name, ArchiveManifest};
use crate::error::{BuildError, IoContext, Result};
use crate::request::{Target, Variant};

pub const ARCHIVE_PREFIX: &str = "GrassKernel";

/// `GrassKernel_<target>_<variant>_<YYYY-MM-DD>.zip`
pub fn archive_name(target: Target, variant: Variant, date: Date) -> String {
    format!(
        "{}_{}_{}_{}.zip",
        ARCHIVE_PREFIX,
        target,
        variant,
        iso_date(date)
    )
}

pub fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

/// Zip the manifest and move the result into `dest_dir`.
///
/// Every manifest entry is checked before anything is written, so a missing
/// asset leaves no archive behind. Returns the final archive path.
pub fn package(
    staging_dir: &Path,
    manifest: &ArchiveManifest,
    target: Target,
    variant: Variant,
    date: Date,
    dest_dir: &Path,
) -> Result<PathBuf> {
    manifest.verify(staging_dir)?;

    let name = archive_name(target, variant, date);
    let staged_archive = staging_dir.join(&name);
    println!("  Creating {}...", name);

    if let Err(e) = write_archive(staging_dir, manifest, &staged_archive) {
        let _ = fs::remove_file(&staged_archive);
        return Err(e);
    }

    relocate(&staged_archive, dest_dir)
}

fn write_archive(staging_dir: &Path, manifest: &ArchiveManifest, archive: &Path) -> Result<()> {
    let file = File::create(archive)
        .io_context(|| format!("creating archive '{}'", archive.display()))?;
    let zip_err = |source: zip::result::ZipError| BuildError::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let mut zip = ZipWriter::new(file);
    for entry in manifest.entries() {
        let src = staging_dir.join(entry);
        let mode = fs::metadata(&src)
            .io_context(|| format!("reading metadata of '{}'", src.display()))?
            .permissions()
            .mode();
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode);

        zip.start_file(entry_name(entry), options).map_err(zip_err)?;
        let mut input =
            File::open(&src).io_context(|| format!("opening '{}'", src.display()))?;
        io::copy(&mut input, &mut zip)
            .io_context(|| format!("compressing '{}'", src.display()))?;
    }
    zip.finish().map_err(zip_err)?;

    Ok(())
}

/// Move `archive` into `dest_dir`, replacing a same-named file there.
pub fn relocate(archive: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = archive.file_name().ok_or_else(|| {
        BuildError::InvalidRequest(format!("archive path has no file name: {}", archive.display()))
    })?;
    let dest = dest_dir.join(file_name);
    if dest == archive {
        return Ok(dest);
    }

    if dest.exists() {
        fs::remove_file(&dest)
            .io_context(|| format!("removing previous archive '{}'", dest.display()))?;
    }

    match fs::rename(archive, &dest) {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            tracing::debug!(from = %archive.display(), to = %dest.display(), "rename crosses filesystems, copying");
            fs::copy(archive, &dest).io_context(|| {
                format!("copying '{}' -> '{}'", archive.display(), dest.display())
            })?;
            fs::remove_file(archive)
                .io_context(|| format!("removing '{}'", archive.display()))?;
        }
        Err(e) => {
            return Err(BuildError::Io {
                context: format!("moving '{}' -> '{}'", archive.display(), dest.display()),
                source: e,
            })
        }
    }

    Ok(dest)
}
