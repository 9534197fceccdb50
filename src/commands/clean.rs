//! Clean command - removes leftover build workspaces.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::workspace;

/// Execute the clean command.
pub fn cmd_clean(config: &Config) -> Result<()> {
    println!("Removing workspaces under {}...", config.work_root.display());
    let removed = workspace::sweep(&config.work_root)
        .with_context(|| format!("Failed to clean {}", config.work_root.display()))?;
    println!("Removed {} workspace(s).", removed);
    Ok(())
}
