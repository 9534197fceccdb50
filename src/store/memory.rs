//! In-memory store.

use anyhow::Result;
use std::collections::HashMap;

use super::{DeploymentRegistry, Factory, Signature, SignatureStore, Template, TemplateStore};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    templates: HashMap<String, Template>,
    factories: HashMap<String, Factory>,
    signatures: HashMap<String, Signature>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, platform: &str, version: &str, bytes: Vec<u8>) -> Self {
        self.templates.insert(
            platform.to_string(),
            Template {
                platform: platform.to_string(),
                version: version.to_string(),
                bytes,
            },
        );
        self
    }

    pub fn with_factory(mut self, factory: Factory) -> Self {
        self.factories.insert(factory.ident.clone(), factory);
        self
    }

    pub fn with_signature(mut self, scope: &str, value: &str) -> Self {
        self.signatures.insert(
            scope.to_string(),
            Signature {
                scope: scope.to_string(),
                value: value.to_string(),
            },
        );
        self
    }
}

impl TemplateStore for MemoryStore {
    fn fetch_template(&self, platform: &str) -> Result<Option<Template>> {
        Ok(self.templates.get(platform).cloned())
    }
}

impl DeploymentRegistry for MemoryStore {
    fn fetch_factory(&self, ident: &str) -> Result<Option<Factory>> {
        Ok(self.factories.get(ident).cloned())
    }
}

impl SignatureStore for MemoryStore {
    fn fetch_signature(&self, scope: &str) -> Result<Option<Signature>> {
        Ok(self.signatures.get(scope).cloned())
    }
}
