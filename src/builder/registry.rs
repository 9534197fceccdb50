//! Platform → builder lookup.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::{Builder, BUILTIN};
use crate::error::{BuildError, Result};

/// Creates a fresh builder for one build.
pub type BuilderFn = fn() -> Box<dyn Builder>;

/// Map of platform identifiers to builder constructors.
///
/// Filled once, then only read.
#[derive(Default)]
pub struct Registry {
    builders: BTreeMap<String, BuilderFn>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_builtin);

/// Process-wide registry of the builtin builders.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builder in [`BUILTIN`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (platform, new) in BUILTIN {
            registry.register(platform, *new);
        }
        registry
    }

    /// Register `new` under `platform`. A later registration replaces an
    /// earlier one.
    pub fn register(&mut self, platform: &str, new: BuilderFn) {
        let key = platform.to_ascii_lowercase();
        if self.builders.insert(key.clone(), new).is_some() {
            tracing::warn!("Builder for {} registered twice, keeping the last one", key);
        } else {
            tracing::debug!("Registered builder: {}", key);
        }
    }

    /// New builder instance for `platform` (case-insensitive).
    pub fn resolve(&self, platform: &str) -> Result<Box<dyn Builder>> {
        self.builders
            .get(&platform.to_ascii_lowercase())
            .map(|new| new())
            .ok_or_else(|| BuildError::BuilderNotFound(platform.to_string()))
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.builders.contains_key(&platform.to_ascii_lowercase())
    }

    /// Registered platforms, sorted.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}
