//! fwforge - modular Lua firmware image builder.
//!
//! Scans the shared firmware root, site libraries, and device roots,
//! resolves each device's file set, and packs deterministic manifests
//! and image files into the output directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fwforge::config::Config;
use fwforge::{build, image};

#[derive(Parser)]
#[command(name = "fwforge")]
#[command(about = "Modular Lua firmware image builder")]
#[command(
    after_help = "QUICK START:\n  fwforge build        Build every device's manifest and image\n  fwforge show config  Show resolved configuration\n  fwforge clean        Remove build artifacts"
)]
struct Cli {
    /// Site base directory (default: current directory)
    #[arg(short = 'C', long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build firmware manifests and images for all devices
    Build {
        /// Build a single device only
        #[arg(long)]
        device: Option<String>,
    },

    /// Clean build artifacts (default: preserves the bytecode cache)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Also clear the bytecode image cache
    Cache,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// List an image file's records and verify its checksum
    Image {
        /// Path to a .img file produced by a build
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Build { device } => {
            build::build(&config, device.as_deref())?;
        }
        Commands::Clean { what } => {
            build::clean(&config, matches!(what, Some(CleanTarget::Cache)))?;
        }
        Commands::Show { what } => match what {
            ShowTarget::Config => config.print(),
            ShowTarget::Image { path } => {
                let info = image::inspect(&path)?;
                println!("Device Id: {}", info.device_id);
                println!("Device Name: {}", info.device_name);
                println!(
                    "Checksum: {} ({})",
                    info.checksum,
                    if info.checksum_ok { "OK" } else { "MISMATCH" }
                );
                println!("Records: {}", info.records.len());
                for record in &info.records {
                    println!("  {} ({} bytes)", record.path, record.size);
                }
            }
        },
    }

    Ok(())
}
