//! Per-build scratch directories.
//!
//! A [`Workspace`] is created under the configured work root with a random
//! UUID name and removed again when it is dropped, unless the build handed
//! it over to the caller with [`Workspace::persist`]. Persisted workspaces
//! carry a [`KEPT_MARKER`] file; only those are touched by [`sweep`], so a
//! build running in another process keeps its directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{IoContext, Result};

/// Name prefix of every workspace directory.
pub const WORKSPACE_PREFIX: &str = "agentforge-";

/// Written into a workspace once it is handed over to the caller.
pub const KEPT_MARKER: &str = ".agentforge-kept";

/// Scratch directory owned by exactly one build.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    /// Remove on drop.
    armed: bool,
    released: bool,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `root`.
    ///
    /// Uses `create_dir` so that a name collision fails instead of two
    /// builds sharing one directory.
    pub fn allocate(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).with_path("create work root", root)?;

        let path = root.join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4().simple()));
        tracing::debug!("Build: creating: {}", path.display());
        fs::create_dir(&path).with_path("create workspace", &path)?;

        Ok(Self {
            path,
            armed: true,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `name` inside the workspace.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop removing the directory on drop; the caller now owns cleanup.
    ///
    /// If the marker cannot be written the workspace is dropped, and so
    /// removed, with the error.
    pub fn persist(mut self) -> Result<Self> {
        let marker = self.path.join(KEPT_MARKER);
        fs::write(&marker, b"").with_path("write", &marker)?;
        self.armed = false;
        Ok(self)
    }

    /// Remove the directory tree. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        tracing::debug!("Build: cleaning up {}", self.path.display());
        release_dir(&self.path);
        self.released = true;
    }

    /// Relative paths of every regular file currently in the workspace.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() != KEPT_MARKER)
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&self.path)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.armed {
            self.release();
        }
    }
}

/// Remove a directory tree, ignoring a directory that is already gone.
pub fn release_dir(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Remove persisted workspaces under `root`. Returns how many were removed.
///
/// Workspaces still owned by a running build have no [`KEPT_MARKER`] and
/// are left alone.
pub fn sweep(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(root).with_path("read", root)? {
        let entry = entry.with_path("read", root)?;
        let name = entry.file_name();
        let path = entry.path();
        let kept = name.to_string_lossy().starts_with(WORKSPACE_PREFIX)
            && entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
            && path.join(KEPT_MARKER).is_file();
        if kept {
            release_dir(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_creates_unique_dirs() {
        let root = TempDir::new().unwrap();
        let a = Workspace::allocate(root.path()).unwrap();
        let b = Workspace::allocate(root.path()).unwrap();

        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let path = {
            let ws = Workspace::allocate(root.path()).unwrap();
            fs::write(ws.join("file"), b"x").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_release_is_idempotent() {
        let root = TempDir::new().unwrap();
        let mut ws = Workspace::allocate(root.path()).unwrap();
        ws.release();
        ws.release();
        assert!(ws.is_released());
        assert!(!ws.path().exists());
    }

    #[test]
    fn test_release_dir_on_missing_path_is_noop() {
        let root = TempDir::new().unwrap();
        release_dir(&root.path().join("never-created"));
    }

    #[test]
    fn test_persist_survives_drop() {
        let root = TempDir::new().unwrap();
        let path = {
            let ws = Workspace::allocate(root.path()).unwrap().persist().unwrap();
            ws.path().to_path_buf()
        };
        assert!(path.is_dir());
    }

    #[test]
    fn test_files_lists_nested_relative_paths() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::allocate(root.path()).unwrap();
        fs::create_dir_all(ws.join("lib/x86")).unwrap();
        fs::write(ws.join("lib/x86/core.so"), b"x").unwrap();
        fs::write(ws.join("agent"), b"x").unwrap();

        assert_eq!(ws.files(), vec!["agent", "lib/x86/core.so"]);
    }

    #[test]
    fn test_sweep_only_touches_workspaces() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::allocate(root.path()).unwrap().persist().unwrap();
        fs::create_dir(root.path().join("unrelated")).unwrap();

        assert_eq!(sweep(root.path()).unwrap(), 1);
        assert!(!ws.path().exists());
        assert!(root.path().join("unrelated").exists());
    }

    #[test]
    fn test_sweep_leaves_live_workspaces() {
        let root = TempDir::new().unwrap();
        let live = Workspace::allocate(root.path()).unwrap();
        fs::write(live.join("core"), b"in progress").unwrap();
        let kept = Workspace::allocate(root.path()).unwrap().persist().unwrap();

        assert_eq!(sweep(root.path()).unwrap(), 1);
        assert!(live.join("core").is_file());
        assert!(!kept.path().exists());
    }

    #[test]
    fn test_kept_marker_is_not_a_workspace_file() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::allocate(root.path()).unwrap().persist().unwrap();
        fs::write(ws.join("agent"), b"x").unwrap();

        assert!(ws.join(KEPT_MARKER).is_file());
        assert_eq!(ws.files(), vec!["agent"]);
    }
}
