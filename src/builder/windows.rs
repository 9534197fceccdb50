//! Windows agents: customer-specific file names, checksum manifest, zip.

use super::{stages, Builder, Stage};
use crate::build::BuildContext;
use crate::error::Result;

pub struct WindowsBuilder;

pub fn new() -> Box<dyn Builder> {
    Box::new(WindowsBuilder)
}

impl Builder for WindowsBuilder {
    fn platform(&self) -> &'static str {
        "windows"
    }

    fn overrides(&self) -> &'static [Stage] {
        &[Stage::Scramble, Stage::Sign, Stage::Pack]
    }

    fn scramble(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::scramble_names(ctx)
    }

    fn sign(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::write_checksums(ctx)
    }

    fn pack(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::pack_outputs(ctx, "windows.zip")
    }
}
