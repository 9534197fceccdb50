//! Build context shared across all stages.
//!
//! Holds the workspace location, the request parameters and the running
//! list of outputs that stages add to or replace.

use std::path::{Path, PathBuf};

use super::BuildRequest;
use crate::store::Factory;

/// Mutable state handed to every stage.
#[derive(Debug)]
pub struct BuildContext {
    /// Registry key of the platform being built.
    pub platform: String,
    /// Workspace directory owned by this build.
    pub workspace: PathBuf,
    /// Deployment record driving the patch.
    pub factory: Factory,
    /// Core file name, relative to the workspace. Stages may rename it.
    pub core_file: String,
    /// Config file name, relative to the workspace. Stages may rename it.
    pub config_file: String,
    /// Leave the demo marker untouched.
    pub demo: bool,
    /// Output file names, relative to the workspace, in production order.
    pub outputs: Vec<String>,
}

impl BuildContext {
    pub fn new(
        platform: &str,
        workspace: &Path,
        request: &BuildRequest,
        factory: Factory,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            workspace: workspace.to_path_buf(),
            factory,
            core_file: request.core.clone(),
            config_file: request.config.clone(),
            demo: request.demo,
            outputs,
        }
    }

    /// Absolute path of a workspace-relative name.
    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.workspace.join(name)
    }

    /// Append `name` unless it is already listed.
    pub fn add_output(&mut self, name: &str) {
        if !self.outputs.iter().any(|o| o == name) {
            self.outputs.push(name.to_string());
        }
    }

    /// Replace `old` with `new` in place, or append `new` if `old` is absent.
    pub fn replace_output(&mut self, old: &str, new: &str) {
        match self.outputs.iter().position(|o| o == old) {
            Some(i) => self.outputs[i] = new.to_string(),
            None => self.add_output(new),
        }
    }

    /// Outputs that are regular files (directory entries are skipped).
    pub fn output_files(&self) -> Vec<String> {
        self.outputs
            .iter()
            .filter(|name| self.path(name.as_str()).is_file())
            .cloned()
            .collect()
    }

    /// Create a context for testing, with a throwaway factory.
    #[doc(hidden)]
    pub fn for_testing(workspace: &Path, core: &str, config: &str) -> Self {
        Self {
            platform: "test".to_string(),
            workspace: workspace.to_path_buf(),
            factory: Factory {
                ident: "RCS_0000000001".to_string(),
                name: "test".to_string(),
                logkey: "logkey".to_string(),
                confkey: "confkey".to_string(),
                configs: Vec::new(),
            },
            core_file: core.to_string(),
            config_file: config.to_string(),
            demo: false,
            outputs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_bookkeeping() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = BuildContext::for_testing(dir.path(), "core", "config");
        ctx.outputs = vec!["lib/".into(), "core".into()];

        ctx.add_output("config");
        ctx.add_output("config");
        ctx.replace_output("core", "a1b2");
        ctx.replace_output("missing", "extra");

        assert_eq!(ctx.outputs, vec!["lib/", "a1b2", "config", "extra"]);
    }

    #[test]
    fn test_output_files_skips_directories_and_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("core"), b"x").unwrap();
        let mut ctx = BuildContext::for_testing(dir.path(), "core", "config");
        ctx.outputs = vec!["lib/".into(), "core".into(), "gone".into()];

        assert_eq!(ctx.output_files(), vec!["core"]);
    }
}
