// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depthcast::constants::MeshDensity;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depthcast")]
#[command(about = "Environment depth raycasting and mesh reconstruction")]
#[command(version = depthcast::constants::app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the compute adapter the pipeline would run on
    Probe,

    /// Print the view-space sample grid for a density preset
    Grid {
        /// Density preset (low, medium, high, very-high, ultra)
        #[arg(short, long, default_value = "medium")]
        density: String,

        /// Fraction of the field of view to cover, in (0, 1]
        #[arg(short, long, default_value = "0.9")]
        margin: f32,
    },

    /// Scan a synthetic scene into a mesh and export it as GLB
    Scan {
        /// Density preset (low, medium, high, very-high, ultra)
        #[arg(short, long)]
        density: Option<String>,

        /// Output file path (default: timestamped file in the export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clip samples to a cuboid around the scene center and export a
        /// LAS point cloud instead of a mesh
        #[arg(short, long)]
        bounded: bool,

        /// Half-extent of the bounded region in meters
        #[arg(long, default_value = "1.0")]
        extent: f32,
    },

    /// Perform a single depth raycast into a synthetic scene
    Raycast {
        /// View-space x coordinate in [0, 1]
        #[arg(short, long, default_value = "0.5")]
        x: f32,

        /// View-space y coordinate in [0, 1]
        #[arg(short, long, default_value = "0.5")]
        y: f32,
    },
}

fn parse_density(name: &str) -> Result<MeshDensity, Box<dyn std::error::Error>> {
    MeshDensity::from_name(name)
        .ok_or_else(|| format!("unknown density preset: {}", name).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depthcast=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe => cli::probe(),
        Commands::Grid { density, margin } => cli::print_grid(parse_density(&density)?, margin),
        Commands::Scan {
            density,
            output,
            bounded,
            extent,
        } => {
            let density = density.as_deref().map(parse_density).transpose()?;
            if bounded {
                cli::scan_bounded(density, extent, output)
            } else {
                cli::scan(density, output)
            }
        }
        Commands::Raycast { x, y } => cli::raycast(x, y),
    }
}
