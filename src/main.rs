use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use antenna_los::config::LosConfig;
use antenna_los::coverage::LosEngine;
use antenna_los::io::{load_antennas_from_csv, save_results};
use antenna_los::terrain::{TerrainLoader, TerrainManager};

#[derive(Parser, Debug)]
#[command(name = "antenna_los", version, about = "Radial line-of-sight grids for antenna sites")]
struct Args {
    /// `;`-separated antenna file
    antenna_file: PathBuf,

    /// Directory of surface model `.hgt` tiles (terrain plus buildings)
    surface_dir: PathBuf,

    /// Directory of bare-ground `.hgt` tiles
    ground_dir: PathBuf,

    #[arg(long, default_value = "los_datasets/")]
    output_dir: PathBuf,

    /// JSON file overriding the default computation parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process antennas and rays on the calling thread only
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Decoded tiles kept in memory per elevation model
    #[arg(long, default_value_t = 50)]
    tile_cache: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LosConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => LosConfig::default(),
    };
    if args.sequential {
        config.parallel = false;
    }

    info!("Antenna file: {:?}", args.antenna_file);
    info!("Surface tiles: {:?}", args.surface_dir);
    info!("Ground tiles: {:?}", args.ground_dir);

    let antennas = load_antennas_from_csv(&args.antenna_file)
        .with_context(|| format!("Failed to read antennas from {:?}", args.antenna_file))?;

    let surface = TerrainManager::new(TerrainLoader::new(args.surface_dir.clone()), args.tile_cache);
    let ground = TerrainManager::new(TerrainLoader::new(args.ground_dir.clone()), args.tile_cache);

    let engine = LosEngine::new(config)
        .with_antennas(antennas)
        .with_surface(Arc::new(surface))
        .with_ground(Arc::new(ground));

    let start = Instant::now();
    let results = engine.compute()?;
    info!("Computed {} antenna grids in {:.2?}", results.len(), start.elapsed());

    let written = save_results(&results, &args.output_dir)
        .with_context(|| format!("Failed to write results to {:?}", args.output_dir))?;
    println!("Wrote {} datasets to {}", written.len(), args.output_dir.display());

    Ok(())
}
