//! macOS agents.

use super::{stages, Builder, Stage};
use crate::build::BuildContext;
use crate::error::Result;

pub struct OsxBuilder;

pub fn new() -> Box<dyn Builder> {
    Box::new(OsxBuilder)
}

impl Builder for OsxBuilder {
    fn platform(&self) -> &'static str {
        "osx"
    }

    fn overrides(&self) -> &'static [Stage] {
        &[Stage::Sign, Stage::Pack]
    }

    fn sign(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::write_checksums(ctx)
    }

    fn pack(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::pack_outputs(ctx, "osx.zip")
    }
}
