//! Build command - builds one agent.

use anyhow::{Context, Result};
use std::time::Instant;

use crate::build::{create, BuildRequest};
use crate::config::Config;
use crate::store::{FsStore, PlainConfig, Services};

/// Execute the build command.
///
/// Without `keep` the workspace is removed after the outputs are listed,
/// so the command only verifies that the build succeeds.
pub fn cmd_build(request: BuildRequest, keep: bool, config: &Config) -> Result<()> {
    println!(
        "=== Building {} agent for {} ===\n",
        request.platform, request.factory
    );
    let start = Instant::now();

    let store = FsStore::new(&config.store_dir);
    let services = Services::from_store(&store, &PlainConfig);

    let platform = request.platform.clone();
    let output = create(request, services, &config.work_root)
        .with_context(|| format!("Build for {} failed", platform))?;

    println!("Core version: {}", output.version);
    println!("Workspace: {}", output.workspace().display());
    println!("Outputs:");
    for path in output.output_paths() {
        println!("  {}", path.display());
    }
    println!("\nBuild finished in {:.1}s", start.elapsed().as_secs_f64());

    if keep {
        println!("Workspace kept. Run 'agentforge clean' to remove it.");
    } else {
        output.release();
    }
    Ok(())
}
