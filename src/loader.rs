//! Resolve the core template and the factory record for one build.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{BuildError, IoContext, Result};
use crate::store::{Factory, Services};

/// Private copy of a core template, deleted when dropped.
#[derive(Debug)]
pub struct LoadedCore {
    pub platform: String,
    pub version: String,
    pub size: u64,
    file: NamedTempFile,
}

impl LoadedCore {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open a fresh read handle on the copy.
    pub fn open(&self) -> Result<File> {
        self.file.reopen().with_path("open", self.file.path())
    }

    /// Delete the copy now.
    pub fn close(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().with_path("remove", path)
    }
}

/// Fetch the template for `platform` and the factory `ident`.
///
/// The template is looked up first, so a missing template is reported
/// regardless of whether the factory exists. The template bytes are
/// materialized as a temp file in `scratch`, named after this build.
pub fn load(
    services: &Services<'_>,
    platform: &str,
    ident: &str,
    scratch: &Path,
) -> Result<(LoadedCore, Factory)> {
    let template = services
        .templates
        .fetch_template(platform)?
        .ok_or_else(|| BuildError::TemplateNotFound(platform.to_string()))?;

    std::fs::create_dir_all(scratch).with_path("create", scratch)?;
    let mut file = tempfile::Builder::new()
        .prefix(&format!("core-{}-", platform))
        .suffix(".zip")
        .tempfile_in(scratch)
        .with_path("create temp file in", scratch)?;
    file.write_all(&template.bytes)
        .and_then(|_| file.flush())
        .with_path("write", file.path())?;

    let core = LoadedCore {
        size: template.size(),
        platform: template.platform,
        version: template.version,
        file,
    };
    tracing::debug!(
        "Build: loaded core: {} {} {} bytes",
        core.platform,
        core.version,
        core.size
    );

    let factory = services
        .factories
        .fetch_factory(ident)?
        .ok_or_else(|| BuildError::FactoryNotFound(ident.to_string()))?;
    tracing::debug!("Build: loaded factory: {}", factory.name);

    Ok((core, factory))
}
