//! File writes with automatic parent directory creation.

use std::fs;
use std::io;
use std::path::Path;

/// Write a file, creating parent directories as needed.
///
/// Config names may contain subdirectories (`etc/agent.cfg`) that the
/// template archive never created.
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}
