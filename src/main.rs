//! Agentforge - per-customer agent builder.
//!
//! Takes a platform core template, patches customer keys and identifiers
//! into its markers, and runs the platform's scramble/melt/sign/pack
//! stages to produce a deployable package.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use agentforge::build::BuildRequest;
use agentforge::commands;
use agentforge::config::Config;

#[derive(Parser)]
#[command(name = "agentforge")]
#[command(about = "Per-customer agent builder")]
#[command(
    after_help = "QUICK START:\n  agentforge show builders   List supported platforms\n  agentforge build --platform windows --factory RCS_0000000001 --core core --config config\n  agentforge clean           Remove leftover workspaces"
)]
struct Cli {
    /// Directory holding .env (default: current directory)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an agent
    Build {
        /// Target platform (selects template and builder)
        #[arg(long)]
        platform: String,
        /// Factory identifier
        #[arg(long)]
        factory: String,
        /// Core file name inside the template
        #[arg(long, default_value = "core")]
        core: String,
        /// Name of the emitted config file
        #[arg(long, default_value = "config")]
        config: String,
        /// Demo build (keeps the demo marker)
        #[arg(long)]
        demo: bool,
        /// Keep the workspace after a successful build
        #[arg(long)]
        keep: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Remove leftover build workspaces
    Clean,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show registered builders
    Builders,
    /// Show templates in the store
    Templates,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    // Load .env if present
    dotenvy::from_path(base_dir.join(".env")).ok();
    let config = Config::load(&base_dir);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Commands::Build {
            platform,
            factory,
            core,
            config: config_file,
            demo,
            keep,
        } => {
            let request = BuildRequest {
                platform,
                factory,
                core,
                config: config_file,
                demo,
            };
            commands::cmd_build(request, keep, &config)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Builders => commands::show::ShowTarget::Builders,
                ShowTarget::Templates => commands::show::ShowTarget::Templates,
            };
            commands::cmd_show(show_target, &config)?;
        }

        Commands::Clean => {
            commands::cmd_clean(&config)?;
        }
    }

    Ok(())
}
