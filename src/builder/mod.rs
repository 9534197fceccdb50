//! Per-platform stage pipelines.
//!
//! Every platform supplies one [`Builder`]. The controller always runs all
//! stages in the same order:
//!
//! ```text
//! patch → scramble → melt → sign → pack
//! ```
//!
//! `patch` has a shared implementation (marker patching plus config
//! emission). The other four default to no-ops, so a platform overrides
//! only what it needs and the controller never has to know which ones.
//!
//! # Adding a platform
//!
//! 1. Add a module with a type implementing [`Builder`]
//! 2. Add it to [`BUILTIN`]
//!
//! Builders are discovered from that list only; there is no runtime
//! plugin loading.

pub mod linux;
pub mod osx;
pub mod registry;
pub mod stages;
pub mod windows;

pub use registry::{registry, BuilderFn, Registry};

use std::fmt;

use crate::build::BuildContext;
use crate::error::Result;
use crate::store::Services;

/// Named pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Patch,
    Scramble,
    Melt,
    Sign,
    Pack,
}

impl Stage {
    /// Execution order.
    pub const ORDER: [Stage; 5] = [
        Stage::Patch,
        Stage::Scramble,
        Stage::Melt,
        Stage::Sign,
        Stage::Pack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Patch => "patch",
            Stage::Scramble => "scramble",
            Stage::Melt => "melt",
            Stage::Sign => "sign",
            Stage::Pack => "pack",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Platform-specific build behavior.
///
/// A fresh instance is created for every build, so implementations may
/// keep per-build state in `self`.
pub trait Builder: Send {
    /// Registry key, lowercase.
    fn platform(&self) -> &'static str;

    /// Stages this builder overrides, in [`Stage::ORDER`].
    fn overrides(&self) -> &'static [Stage] {
        &[]
    }

    /// Patch markers into the core file and emit the config file.
    fn patch(&mut self, ctx: &mut BuildContext, services: &Services<'_>) -> Result<()> {
        stages::patch(ctx, services)
    }

    /// Binary obfuscation.
    fn scramble(&mut self, _ctx: &mut BuildContext) -> Result<()> {
        tracing::debug!("default scramble");
        Ok(())
    }

    /// Junk-code insertion.
    fn melt(&mut self, _ctx: &mut BuildContext) -> Result<()> {
        tracing::debug!("default melt");
        Ok(())
    }

    /// Code signing.
    fn sign(&mut self, _ctx: &mut BuildContext) -> Result<()> {
        tracing::debug!("default sign");
        Ok(())
    }

    /// Final container assembly.
    fn pack(&mut self, _ctx: &mut BuildContext) -> Result<()> {
        tracing::debug!("default pack");
        Ok(())
    }
}

/// Builders compiled into this binary.
pub const BUILTIN: &[(&str, BuilderFn)] = &[
    ("linux", linux::new as BuilderFn),
    ("osx", osx::new as BuilderFn),
    ("windows", windows::new as BuilderFn),
];

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Builder for Bare {
        fn platform(&self) -> &'static str {
            "bare"
        }
    }

    #[test]
    fn test_default_stages_do_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = BuildContext::for_testing(dir.path(), "core", "config");
        ctx.outputs = vec!["core".into()];

        let mut bare = Bare;
        bare.scramble(&mut ctx).unwrap();
        bare.melt(&mut ctx).unwrap();
        bare.sign(&mut ctx).unwrap();
        bare.pack(&mut ctx).unwrap();

        assert_eq!(ctx.outputs, vec!["core"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(bare.overrides().is_empty());
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<_> = Stage::ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["patch", "scramble", "melt", "sign", "pack"]);
        assert!(Stage::ORDER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_builtin_overrides_are_ordered() {
        for (platform, new) in BUILTIN {
            let builder = new();
            assert_eq!(builder.platform(), *platform);
            assert!(builder.overrides().windows(2).all(|w| w[0] < w[1]));
        }
    }
}
