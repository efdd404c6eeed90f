//! Overland terrain preview.
//!
//! Prints an ASCII map of a world area to stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use overland_common::WorldCoord;
use overland_tools::{legend, render_area, terrain_histogram, transition_report, Area};
use overland_world::{ChunkManager, RegionContext, WorldConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "overland-preview")]
#[command(about = "Print an ASCII map of procedurally generated overworld terrain")]
struct Args {
    /// World config file (TOML); defaults are used if missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the world seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Region theme (forest, mountains, desert, swamp, coastal, plains)
    #[arg(short, long)]
    theme: Option<String>,

    /// Center X in world tiles
    #[arg(short = 'x', long, default_value = "0", allow_negative_numbers = true)]
    center_x: i64,

    /// Center Y in world tiles
    #[arg(short = 'y', long, default_value = "0", allow_negative_numbers = true)]
    center_y: i64,

    /// Width of the map in tiles
    #[arg(short = 'W', long, default_value = "64")]
    width: u32,

    /// Height of the map in tiles
    #[arg(short = 'H', long, default_value = "32")]
    height: u32,

    /// Also print the legend, a histogram and unnatural transitions
    #[arg(short, long)]
    report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("overland_world=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorldConfig::load_from(path),
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world_seed = seed;
    }

    let manager = ChunkManager::from_config(&config)?;
    if let Some(theme) = &args.theme {
        manager.set_region_context(RegionContext::new(theme.as_str()));
    }

    let area = Area::centered(
        WorldCoord::new(args.center_x, args.center_y),
        args.width,
        args.height,
    );
    print!("{}", render_area(&manager, area));

    if args.report {
        println!();
        print!("{}", legend());
        println!();
        for (terrain, count) in terrain_histogram(&manager, area) {
            println!("{terrain:>10} {count}");
        }
        let issues = transition_report(&manager, area);
        println!();
        println!("{} unnatural transitions", issues.len());
        for issue in issues.iter().take(20) {
            println!(
                "  ({}, {}) - ({}, {}): {}",
                issue.at.x, issue.at.y, issue.neighbor.x, issue.neighbor.y, issue.warning
            );
        }
    }

    let stats = manager.stats();
    info!(
        "Generated {} chunks, {} relaxed cells",
        stats.generated_chunks, stats.relaxed_cells
    );
    Ok(())
}
