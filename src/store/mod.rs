//! Collaborators the build pipeline reads from.
//!
//! The pipeline never talks to a database directly. It asks these traits
//! for templates, deployment records and signatures, and hands config
//! blobs to a [`ConfigEncryptor`]. Two implementations ship with the
//! crate:
//!
//! - [`FsStore`] - records laid out as files under one directory
//! - [`MemoryStore`] - in-process maps, for tests and embedding

pub mod fs;
pub mod memory;

pub use self::fs::FsStore;
pub use memory::MemoryStore;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Scope of the signature embedded in agents.
pub const AGENT_SCOPE: &str = "agent";

/// Unpatched core archive for one platform.
#[derive(Debug, Clone)]
pub struct Template {
    pub platform: String,
    pub version: String,
    pub bytes: Vec<u8>,
}

impl Template {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One configuration document attached to a factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigBlob {
    #[serde(default)]
    pub name: String,
    pub content: serde_json::Value,
}

/// Deployment record ("factory") of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    pub ident: String,
    #[serde(default)]
    pub name: String,
    pub logkey: String,
    pub confkey: String,
    #[serde(default)]
    pub configs: Vec<ConfigBlob>,
}

/// Named signing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub scope: String,
    pub value: String,
}

pub trait TemplateStore: Send + Sync {
    /// Template for `platform`, or `None` if none is registered.
    fn fetch_template(&self, platform: &str) -> Result<Option<Template>>;
}

pub trait DeploymentRegistry: Send + Sync {
    fn fetch_factory(&self, ident: &str) -> Result<Option<Factory>>;
}

pub trait SignatureStore: Send + Sync {
    fn fetch_signature(&self, scope: &str) -> Result<Option<Signature>>;
}

/// Turns a stored configuration into the bytes shipped next to the agent.
pub trait ConfigEncryptor: Send + Sync {
    fn encrypted_config(&self, config: &ConfigBlob, conf_key: &str) -> Result<Vec<u8>>;
}

/// Writes the configuration document as compact JSON.
///
/// Used when configs are already protected at rest, or in tests. Real
/// deployments plug their cipher in through [`ConfigEncryptor`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainConfig;

impl ConfigEncryptor for PlainConfig {
    fn encrypted_config(&self, config: &ConfigBlob, _conf_key: &str) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&config.content)?)
    }
}

/// Everything a build reads from, by reference.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub templates: &'a dyn TemplateStore,
    pub factories: &'a dyn DeploymentRegistry,
    pub signatures: &'a dyn SignatureStore,
    pub encryptor: &'a dyn ConfigEncryptor,
}

impl<'a> Services<'a> {
    /// Use one store for templates, factories and signatures.
    pub fn from_store<S>(store: &'a S, encryptor: &'a dyn ConfigEncryptor) -> Self
    where
        S: TemplateStore + DeploymentRegistry + SignatureStore,
    {
        Self {
            templates: store,
            factories: store,
            signatures: store,
            encryptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_deserializes_without_optional_fields() {
        let json = r#"{"ident":"RCS_0000000001","logkey":"l","confkey":"c"}"#;
        let factory: Factory = serde_json::from_str(json).unwrap();
        assert_eq!(factory.ident, "RCS_0000000001");
        assert!(factory.configs.is_empty());
        assert!(factory.name.is_empty());
    }

    #[test]
    fn test_plain_config_writes_json() {
        let blob = ConfigBlob {
            name: "default".into(),
            content: serde_json::json!({"sync": {"host": "collector.local"}}),
        };
        let bytes = PlainConfig.encrypted_config(&blob, "key").unwrap();
        let back: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back["sync"]["host"], "collector.local");
    }
}
