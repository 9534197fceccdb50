//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Build an agent for one platform/factory
//! - `show` - Display configuration, builders and templates
//! - `clean` - Remove leftover workspaces

pub mod build;
pub mod clean;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use show::cmd_show;
