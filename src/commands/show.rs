//! Show command - displays information.

use anyhow::Result;

use crate::builder::registry;
use crate::config::Config;
use crate::store::FsStore;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show registered builders and the stages they override
    Builders,
    /// Show templates available in the store
    Templates,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Builders => {
            let registry = registry();
            if registry.is_empty() {
                println!("No builders registered");
                return Ok(());
            }
            println!("Builders ({}):", registry.len());
            for platform in registry.platforms() {
                let builder = registry.resolve(platform)?;
                let stages: Vec<_> = builder.overrides().iter().map(|s| s.name()).collect();
                if stages.is_empty() {
                    println!("  {:<10} (defaults only)", platform);
                } else {
                    println!("  {:<10} {}", platform, stages.join(", "));
                }
            }
        }
        ShowTarget::Templates => {
            let store = FsStore::new(&config.store_dir);
            let platforms = store.platforms()?;
            if platforms.is_empty() {
                println!("No templates in {}", config.store_dir.display());
            }
            for platform in platforms {
                let marker = if registry().contains(&platform) {
                    ""
                } else {
                    "  (no builder)"
                };
                println!("  {}{}", platform, marker);
            }
        }
    }
    Ok(())
}
