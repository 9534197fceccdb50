//! File-backed store.
//!
//! Layout under the store root:
//!
//! ```text
//! templates/<platform>.zip     core archive
//! templates/<platform>.json    {"version": "..."} (optional)
//! factories/<ident>.json       Factory record
//! signatures/<scope>.json      Signature record
//! ```

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{DeploymentRegistry, Factory, Signature, SignatureStore, Template, TemplateStore};

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

#[derive(Deserialize)]
struct TemplateMeta {
    version: String,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, kind: &str, key: &str, ext: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Invalid {} key: '{}'", kind, key);
        }
        Ok(self.root.join(kind).join(format!("{}.{}", key, ext)))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let json =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// List platforms that have a template archive.
    pub fn platforms(&self) -> Result<Vec<String>> {
        let dir = self.root.join("templates");
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut platforms = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "zip") {
                if let Some(stem) = path.file_stem() {
                    platforms.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        platforms.sort();
        Ok(platforms)
    }
}

impl TemplateStore for FsStore {
    fn fetch_template(&self, platform: &str) -> Result<Option<Template>> {
        let archive = self.record_path("templates", platform, "zip")?;
        if !archive.exists() {
            return Ok(None);
        }

        let bytes =
            fs::read(&archive).with_context(|| format!("Failed to read {}", archive.display()))?;
        let version = Self::read_json::<TemplateMeta>(&archive.with_extension("json"))?
            .map(|m| m.version)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Some(Template {
            platform: platform.to_string(),
            version,
            bytes,
        }))
    }
}

impl DeploymentRegistry for FsStore {
    fn fetch_factory(&self, ident: &str) -> Result<Option<Factory>> {
        Self::read_json(&self.record_path("factories", ident, "json")?)
    }
}

impl SignatureStore for FsStore {
    fn fetch_signature(&self, scope: &str) -> Result<Option<Signature>> {
        Self::read_json(&self.record_path("signatures", scope, "json")?)
    }
}
