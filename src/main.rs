mod session;
mod settings;

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use cubit_blocks::BlockRegistry;
use cubit_gen::{WorldGenConfig, load_config_from_path};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::session::Session;
use crate::settings::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "cubit", version, about = "Headless voxel world session")]
struct Cli {
    /// Session config (cubit.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Block table replacing the built-in one
    #[arg(long)]
    blocks: Option<PathBuf>,
    /// Terrain generation parameters (worldgen.toml)
    #[arg(long)]
    worldgen: Option<PathBuf>,
    #[arg(long)]
    seed: Option<i32>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Mesh radius in rendering cubes
    #[arg(long)]
    draw_dist: Option<i32>,
    /// Directory for chunk files
    #[arg(long)]
    archive: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Mirror log output into this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(level: LevelFilter, file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match file {
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_env("RUST_LOG")
                .init();
        }
        Some(path) => {
            let out = File::create(path)?;
            let cfg = simplelog::Config::default();
            CombinedLogger::init(vec![
                TermLogger::new(level, cfg.clone(), TerminalMode::Mixed, ColorChoice::Auto),
                WriteLogger::new(level, cfg, out),
            ])?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info);
    init_logging(level, cli.log_file.as_deref())?;

    let mut cfg = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(t) = cli.ticks {
        cfg.ticks = t;
    }
    if let Some(d) = cli.draw_dist {
        cfg.draw_dist = d;
    }
    if let Some(dir) = cli.archive {
        cfg.archive = Some(dir);
    }

    let reg = match &cli.blocks {
        Some(path) => BlockRegistry::load_from_path(path)?,
        None => BlockRegistry::builtin()?,
    };
    let mut gen_cfg = match &cli.worldgen {
        Some(path) => load_config_from_path(path)?,
        None => WorldGenConfig::default(),
    };
    if let Some(seed) = cli.seed {
        gen_cfg.seed = seed;
    }
    log::info!(
        "session: {} ticks, draw distance {}, seed {}, {} block types",
        cfg.ticks,
        cfg.draw_dist,
        gen_cfg.seed,
        reg.by_name.len().saturating_sub(1)
    );

    let mut session = Session::new(cfg, Arc::new(reg), &gen_cfg)?;
    let report = session.run();
    session.shutdown();
    println!(
        "ticks={} chunks={} requested={} meshes={} quads={} edits={} saves={} entities={} elapsed_ms={}",
        report.ticks,
        report.chunks_ready,
        report.chunks_requested,
        report.meshes,
        report.quads,
        report.edits,
        report.saves,
        report.entities,
        report.elapsed_ms
    );
    Ok(())
}
