//! Unpack core archives into a workspace.
//!
//! Entries whose target path already exists are left alone, so a template
//! that was pre-staged in the workspace (or a resumed extraction) is not
//! overwritten. Every entry name is still reported as a build output.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;

use crate::error::{BuildError, IoContext, Result};

/// Extract every entry of a zip archive under `dest`.
///
/// Returns the entry names, in archive order, whether or not they were
/// written.
pub fn extract_archive<R: Read + Seek>(reader: R, dest: &Path) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut outputs = Vec::with_capacity(archive.len());
    let mut written = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        // Reject absolute paths and `..` components.
        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or(BuildError::Archive(zip::result::ZipError::InvalidArchive(
                "entry escapes the workspace",
            )))?;
        let target = dest.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_path("create", parent)?;
        }

        if !target.exists() {
            if entry.is_dir() {
                fs::create_dir_all(&target).with_path("create", &target)?;
            } else {
                let mut out = File::create(&target).with_path("create", &target)?;
                io::copy(&mut entry, &mut out).with_path("write", &target)?;
                set_mode(&target, entry.unix_mode())?;
            }
            written += 1;
        }

        outputs.push(name);
    }

    tracing::debug!(
        "Build: unpacked {} entries ({} written, {} already present)",
        outputs.len(),
        written,
        outputs.len() - written
    );
    Ok(outputs)
}

/// Extract an in-memory archive.
pub fn extract_bytes(bytes: &[u8], dest: &Path) -> Result<Vec<String>> {
    extract_archive(Cursor::new(bytes), dest)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .with_path("set permissions on", path)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}
