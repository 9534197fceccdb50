//! Configuration management for agentforge.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Agentforge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the file-backed template/factory/signature store
    pub store_dir: PathBuf,
    /// Parent directory of build workspaces (default: system temp dir)
    pub work_root: PathBuf,
    /// Tracing filter directive (e.g., "info", "agentforge=debug")
    pub log_filter: String,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// The .env file is looked up in `base_dir`. Relative paths are
    /// resolved against `base_dir` as well.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path_iter(&env_path) {
                Ok(iter) => {
                    for (key, value) in iter.flatten() {
                        env_vars.insert(key, value);
                    }
                }
                Err(e) => eprintln!("  [WARN] Failed to read {}: {}", env_path.display(), e),
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        Self::from_vars(base_dir, &env_vars)
    }

    /// Build config from an explicit variable map.
    pub fn from_vars(base_dir: &Path, vars: &HashMap<String, String>) -> Self {
        let resolve = |s: &String| {
            let path = PathBuf::from(s);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let store_dir = vars
            .get("AGENTFORGE_STORE")
            .map(resolve)
            .or_else(|| dirs::data_dir().map(|d| d.join("agentforge")))
            .unwrap_or_else(|| base_dir.join("store"));

        let work_root = vars
            .get("AGENTFORGE_WORK_ROOT")
            .map(resolve)
            .unwrap_or_else(std::env::temp_dir);

        let log_filter = vars
            .get("AGENTFORGE_LOG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            store_dir,
            work_root,
            log_filter,
        }
    }

    /// Check if the store has a templates directory.
    pub fn has_store(&self) -> bool {
        self.store_dir.join("templates").is_dir()
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  AGENTFORGE_STORE: {}", self.store_dir.display());
        println!("  AGENTFORGE_WORK_ROOT: {}", self.work_root.display());
        println!("  AGENTFORGE_LOG: {}", self.log_filter);
        if self.has_store() {
            println!("  Store: FOUND");
        } else {
            println!("  Store: NOT FOUND (expected {}/templates)", self.store_dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let config = Config::from_vars(
            Path::new("/srv/forge"),
            &vars(&[("AGENTFORGE_STORE", "store"), ("AGENTFORGE_WORK_ROOT", "/tmp/work")]),
        );
        assert_eq!(config.store_dir, PathBuf::from("/srv/forge/store"));
        assert_eq!(config.work_root, PathBuf::from("/tmp/work"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Path::new("/srv/forge"), &HashMap::new());
        assert_eq!(config.work_root, std::env::temp_dir());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.store_dir.ends_with("agentforge") || config.store_dir.ends_with("store"));
    }
}
