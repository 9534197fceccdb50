use super::{stages, Builder, Stage};
use crate::build::BuildContext;
use crate::error::Result;

pub struct LinuxBuilder;

pub fn new() -> Box<dyn Builder> {
    Box::new(LinuxBuilder)
}

impl Builder for LinuxBuilder {
    fn platform(&self) -> &'static str {
        "linux"
    }

    fn overrides(&self) -> &'static [Stage] {
        &[Stage::Pack]
    }

    fn pack(&mut self, ctx: &mut BuildContext) -> Result<()> {
        stages::pack_outputs(ctx, "linux.zip")
    }
}
