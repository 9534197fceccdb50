//! Stage implementations shared between platform builders.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use zip::write::FileOptions;

use crate::build::BuildContext;
use crate::common::write_file_with_dirs;
use crate::error::{BuildError, IoContext, Result};
use crate::markers::{self, CoreSecrets, Marker};
use crate::store::{Services, AGENT_SCOPE};

/// Name of the integrity manifest written by [`write_checksums`].
pub const CHECKSUM_FILE: &str = "SHA256SUMS";

/// Patch the core file in place and write the factory config next to it.
pub fn patch(ctx: &mut BuildContext, services: &Services<'_>) -> Result<()> {
    tracing::debug!("Build: patching [{}] file", ctx.core_file);

    let core_path = ctx.path(&ctx.core_file);
    if !core_path.is_file() {
        return Err(BuildError::CoreFileMissing(ctx.core_file.clone()));
    }
    let mut content = fs::read(&core_path).with_path("read", &core_path)?;

    let signature = services
        .signatures
        .fetch_signature(AGENT_SCOPE)?
        .map(|s| s.value)
        .ok_or(BuildError::CryptoInputMissing(Marker::Signature))?;

    let secrets = CoreSecrets {
        log_key: ctx.factory.logkey.clone(),
        conf_key: ctx.factory.confkey.clone(),
        signature,
        ident: ctx.factory.ident.clone(),
    };
    markers::patch_core(&mut content, &secrets, ctx.demo)?;
    fs::write(&core_path, &content).with_path("write", &core_path)?;

    tracing::debug!("Build: saving config to [{}] file", ctx.config_file);
    let config = ctx
        .factory
        .configs
        .first()
        .ok_or_else(|| BuildError::ConfigMissing(ctx.factory.ident.clone()))?;
    let bytes = services
        .encryptor
        .encrypted_config(config, &ctx.factory.confkey)?;

    let config_path = ctx.path(&ctx.config_file);
    write_file_with_dirs(&config_path, bytes).with_path("write", &config_path)?;
    let config_file = ctx.config_file.clone();
    ctx.add_output(&config_file);

    Ok(())
}

/// Per-customer file name: hash of ident and original name, same extension.
pub fn scrambled_name(ident: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ident.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let path = Path::new(name);
    let stem = &digest[..12];
    let file = match path.extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem.to_string(),
    };
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => format!("{}/{}", parent.to_string_lossy(), file),
        None => file,
    }
}

/// Rename the core and config files to customer-specific names.
pub fn scramble_names(ctx: &mut BuildContext) -> Result<()> {
    let core = scrambled_name(&ctx.factory.ident, &ctx.core_file);
    let config = scrambled_name(&ctx.factory.ident, &ctx.config_file);

    let renames = [
        (ctx.core_file.clone(), core.clone()),
        (ctx.config_file.clone(), config.clone()),
    ];
    for (old, new) in renames {
        let from = ctx.path(&old);
        let to = ctx.path(&new);
        tracing::debug!("Build: scrambling [{}] -> [{}]", old, new);
        fs::rename(&from, &to).with_path("rename", &from)?;
        ctx.replace_output(&old, &new);
    }

    ctx.core_file = core;
    ctx.config_file = config;
    Ok(())
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_path("open", path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_path("read", path)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Write a `sha256sum`-compatible manifest of the current output files.
pub fn write_checksums(ctx: &mut BuildContext) -> Result<()> {
    let mut manifest = String::new();
    for name in ctx.output_files() {
        let hash = sha256_file(&ctx.path(&name))?;
        manifest.push_str(&format!("{}  {}\n", hash, name));
    }

    let path = ctx.path(CHECKSUM_FILE);
    fs::write(&path, manifest).with_path("write", &path)?;
    ctx.add_output(CHECKSUM_FILE);
    Ok(())
}

/// Zip every output file into `archive_name`; it becomes the only output.
pub fn pack_outputs(ctx: &mut BuildContext, archive_name: &str) -> Result<()> {
    let final_path = ctx.path(archive_name);
    let tmp_path = ctx.path(format!("{}.partial", archive_name));

    let file = File::create(&tmp_path).with_path("create", &tmp_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let base = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for name in ctx.output_files() {
        if name == archive_name {
            continue;
        }
        let path = ctx.path(&name);
        let opts = match file_mode(&path) {
            Some(mode) => base.unix_permissions(mode),
            None => base,
        };
        zip.start_file(name.as_str(), opts)?;
        let mut input = File::open(&path).with_path("open", &path)?;
        io::copy(&mut input, &mut zip).with_path("pack", &path)?;
    }
    zip.finish()?;
    drop(zip);

    fs::rename(&tmp_path, &final_path).with_path("rename", &tmp_path)?;
    tracing::debug!("Build: packed outputs into [{}]", archive_name);
    ctx.outputs = vec![archive_name.to_string()];
    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn ctx_with_files(dir: &Path) -> BuildContext {
        fs::write(dir.join("core"), b"core-bytes").unwrap();
        fs::write(dir.join("config"), b"{}").unwrap();
        let mut ctx = BuildContext::for_testing(dir, "core", "config");
        ctx.outputs = vec!["core".into(), "config".into()];
        ctx
    }

    #[test]
    fn test_scrambled_name_is_stable_per_customer() {
        let a = scrambled_name("RCS_0000000001", "core.exe");
        assert_eq!(a, scrambled_name("RCS_0000000001", "core.exe"));
        assert_ne!(a, scrambled_name("RCS_0000000002", "core.exe"));
        assert!(a.ends_with(".exe"));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_scrambled_name_keeps_directory() {
        let name = scrambled_name("RCS_0000000001", "bin/core");
        assert!(name.starts_with("bin/"));
        assert_eq!(name.len(), 4 + 12);
    }

    #[test]
    fn test_scramble_renames_and_updates_outputs() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_files(dir.path());

        scramble_names(&mut ctx).unwrap();

        assert!(!dir.path().join("core").exists());
        assert!(!dir.path().join("config").exists());
        assert_eq!(ctx.outputs, vec![ctx.core_file.clone(), ctx.config_file.clone()]);
        assert_eq!(fs::read(dir.path().join(&ctx.core_file)).unwrap(), b"core-bytes");
    }

    #[test]
    fn test_checksums_cover_outputs() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_files(dir.path());

        write_checksums(&mut ctx).unwrap();

        let manifest = fs::read_to_string(dir.path().join(CHECKSUM_FILE)).unwrap();
        let lines: Vec<_> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("  core"));
        assert_eq!(
            lines[0].split_whitespace().next().unwrap(),
            hex::encode(Sha256::digest(b"core-bytes"))
        );
        assert_eq!(ctx.outputs.last().unwrap(), CHECKSUM_FILE);
    }

    #[test]
    fn test_pack_supersedes_outputs() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ctx_with_files(dir.path());

        pack_outputs(&mut ctx, "agent.zip").unwrap();

        assert_eq!(ctx.outputs, vec!["agent.zip"]);
        assert!(!dir.path().join("agent.zip.partial").exists());

        let file = File::open(dir.path().join("agent.zip")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 2);
        let mut core = String::new();
        archive.by_name("core").unwrap().read_to_string(&mut core).unwrap();
        assert_eq!(core, "core-bytes");
    }
}
