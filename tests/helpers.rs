//! Shared test utilities for agentforge tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::FileOptions;

use agentforge::markers::Marker;
use agentforge::store::{ConfigBlob, Factory, MemoryStore, AGENT_SCOPE};

pub const IDENT: &str = "RCS_0000000042";
pub const SIGNATURE: &str = "per-customer-agent-signature";

/// Test environment with a temporary work root and store directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Parent of build workspaces
    pub work_root: PathBuf,
    /// Root of a file-backed store
    pub store_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let work_root = temp_dir.path().join("work");
        let store_dir = temp_dir.path().join("store");

        Self {
            _temp_dir: temp_dir,
            work_root,
            store_dir,
        }
    }

    /// Entries currently under the work root (workspaces and temp copies).
    pub fn work_entries(&self) -> Vec<PathBuf> {
        if !self.work_root.exists() {
            return Vec::new();
        }
        fs::read_dir(&self.work_root)
            .expect("Failed to read work root")
            .map(|e| e.expect("bad dir entry").path())
            .collect()
    }

    /// Write a template and records into the file-backed store layout.
    pub fn populate_store(&self, platform: &str, version: &str) {
        let templates = self.store_dir.join("templates");
        let factories = self.store_dir.join("factories");
        let signatures = self.store_dir.join("signatures");
        for dir in [&templates, &factories, &signatures] {
            fs::create_dir_all(dir).expect("Failed to create store dir");
        }

        fs::write(templates.join(format!("{}.zip", platform)), default_template())
            .expect("Failed to write template");
        fs::write(
            templates.join(format!("{}.json", platform)),
            format!(r#"{{"version":"{}"}}"#, version),
        )
        .expect("Failed to write template meta");
        fs::write(
            factories.join(format!("{}.json", IDENT)),
            serde_json::to_string(&factory()).unwrap(),
        )
        .expect("Failed to write factory");
        fs::write(
            signatures.join(format!("{}.json", AGENT_SCOPE)),
            format!(r#"{{"scope":"{}","value":"{}"}}"#, AGENT_SCOPE, SIGNATURE),
        )
        .expect("Failed to write signature");
    }
}

/// A fake executable image carrying every marker exactly once.
pub fn core_image() -> Vec<u8> {
    core_image_with(&Marker::ALL)
}

/// A fake executable image carrying only `markers`.
pub fn core_image_with(markers: &[Marker]) -> Vec<u8> {
    let mut image = b"\x7fELF\x02\x01\x01\x00".to_vec();
    image.extend_from_slice(&[0u8; 64]);
    for marker in markers {
        image.extend_from_slice(b"\x00\x00\x00\x00");
        image.extend_from_slice(marker.pattern());
        image.extend_from_slice(&[0xcc; 16]);
    }
    image.extend_from_slice(b"\x00.text end of image");
    image
}

/// Zip the given entries in order.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, FileOptions::default())
                .expect("Failed to add directory");
        } else {
            zip.start_file(*name, FileOptions::default())
                .expect("Failed to start file");
            zip.write_all(data).expect("Failed to write entry");
        }
    }
    zip.finish().expect("Failed to finish zip").into_inner()
}

/// Template archive: a core plus a helper library in a subdirectory.
pub fn default_template() -> Vec<u8> {
    zip_entries(&[
        ("core", &core_image()),
        ("lib/", b""),
        ("lib/helper.dylib", b"helper library"),
    ])
}

pub fn factory() -> Factory {
    Factory {
        ident: IDENT.to_string(),
        name: "acme".to_string(),
        logkey: "evidence-log-key".to_string(),
        confkey: "config-key".to_string(),
        configs: vec![ConfigBlob {
            name: "default".to_string(),
            content: serde_json::json!({"sync": {"host": "collector.acme.local", "interval": 60}}),
        }],
    }
}

/// Store with templates for every builtin platform, the factory and the
/// agent signature.
pub fn full_store() -> MemoryStore {
    MemoryStore::new()
        .with_template("windows", "9.1.0", default_template())
        .with_template("osx", "9.1.0", default_template())
        .with_template("linux", "9.1.0", default_template())
        .with_factory(factory())
        .with_signature(AGENT_SCOPE, SIGNATURE)
}

/// Offset of `marker` in `image`.
pub fn marker_offset(image: &[u8], marker: Marker) -> usize {
    agentforge::patch::find_all(image, marker.pattern())[0]
}

pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "Expected file to exist: {}", path.display());
}
