//! `terrane`: generate, inspect and serve voxel worlds.
#![forbid(unsafe_code)]

mod config;
mod logging;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use terrane_content::{ContentDefs, ContentRegistry};
use terrane_edit::DirtyTracker;
use terrane_geom::{V2, V3, VoxelArea};
use terrane_map::{Map, ModState};
use terrane_mapgen::MapGenerator;
use terrane_runtime::{Command, Reply, Runtime};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "terrane", about = "Voxel map engine: generate, inspect and serve worlds")]
struct Cli {
    /// World directory (holds map.sqlite, terrane.toml and debug.txt)
    #[arg(long, short, default_value = "world")]
    world: PathBuf,
    /// Config file; defaults to <world>/terrane.toml when present
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Content definitions; overrides `nodes` in the config
    #[arg(long)]
    nodes: Option<PathBuf>,
    /// Seed for a new world; overrides `map.fixed_map_seed`
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, short)]
    verbose: bool,
    /// Do not write debug.txt into the world directory
    #[arg(long)]
    no_debug_file: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate every block within a box around a centre block and save
    Generate {
        /// Horizontal radius in blocks
        #[arg(long, default_value_t = 2)]
        radius: i32,
        /// Vertical radius in blocks
        #[arg(long, default_value_t = 1)]
        height: i32,
        /// Centre block (X Y Z)
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_hyphen_values = true)]
        center: Option<Vec<i32>>,
    },
    /// Print the seed and what the store holds
    Info,
    /// List stored block positions
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the nodes of one column between two heights
    Column {
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        z: i32,
        #[arg(long, default_value_t = -16, allow_hyphen_values = true)]
        y_min: i32,
        #[arg(long, default_value_t = 32, allow_hyphen_values = true)]
        y_max: i32,
    },
    /// Run the tick thread: emerge the area around the origin and keep it alive
    Run {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        #[arg(long, default_value_t = 2)]
        radius: i32,
    },
}

fn open_map(cli: &Cli, cfg: &Config) -> Result<Map, Box<dyn Error>> {
    let defs: Arc<dyn ContentDefs> = match cli.nodes.as_ref().or(cfg.nodes.as_ref()) {
        Some(path) => {
            log::info!(target: "map", "loading content definitions from {}", path.display());
            Arc::new(ContentRegistry::load_from_path(path)?)
        }
        None => Arc::new(ContentRegistry::builtin()),
    };
    let generator: Arc<dyn MapGenerator> = Arc::from(cfg.mapgen.build());
    let mut map_cfg = cfg.map.clone();
    if cli.seed.is_some() {
        map_cfg.fixed_map_seed = cli.seed;
    }
    Ok(Map::open(&cli.world, defs, generator, map_cfg)?)
}

fn block_box(center: V3, radius: i32, height: i32) -> Vec<V3> {
    VoxelArea::new(
        center - V3::new(radius, height, radius),
        center + V3::new(radius, height, radius),
    )
    .iter()
    .collect()
}

fn generate(cli: &Cli, cfg: &Config, center: V3, radius: i32, height: i32) -> Result<(), Box<dyn Error>> {
    let mut map = open_map(cli, cfg)?;
    let tracker = Arc::new(std::sync::Mutex::new(DirtyTracker::new()));
    map.add_event_receiver(Box::new(tracker.clone()));

    let blocks = block_box(center, radius, height);
    let start = Instant::now();
    let mut generated = 0usize;
    for bp in &blocks {
        if map.emerge_block(*bp, true)? {
            generated += 1;
        }
    }
    let stats = map.save(ModState::WriteNeeded)?;
    let touched = tracker.lock().map(|t| t.dirty_blocks().len()).unwrap_or(0);
    log::info!(
        target: "mapgen",
        "{} of {} blocks ready in {:?}; {} touched, {} written",
        generated,
        blocks.len(),
        start.elapsed(),
        touched,
        stats.blocks
    );
    Ok(())
}

fn info(cli: &Cli, cfg: &Config) -> Result<(), Box<dyn Error>> {
    let map = open_map(cli, cfg)?;
    let stored = map.list_all_loadable_blocks()?;
    println!("world:   {}", cli.world.display());
    println!("seed:    {}", map.seed());
    println!("blocks:  {}", stored.len());
    if let (Some(first), Some(last)) = (stored.iter().min(), stored.iter().max()) {
        println!("extent:  {} .. {}", first, last);
    }
    println!("ground at origin: {}", map.find_ground_level(V2::new(0, 0)));
    Ok(())
}

fn list(cli: &Cli, cfg: &Config, limit: Option<usize>) -> Result<(), Box<dyn Error>> {
    let map = open_map(cli, cfg)?;
    let stored = map.list_all_loadable_blocks()?;
    for bp in stored.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}", bp);
    }
    Ok(())
}

fn column(cli: &Cli, cfg: &Config, x: i32, z: i32, y_min: i32, y_max: i32) -> Result<(), Box<dyn Error>> {
    let mut map = open_map(cli, cfg)?;
    map.set_saving_enabled(false);
    let defs = Arc::clone(map.defs());
    for y in (y_min..=y_max).rev() {
        let p = V3::new(x, y, z);
        if !map.emerge_block(terrane_block::node_block_pos(p), false)? {
            println!("{:>6}  (not stored)", y);
            continue;
        }
        let n = map.get_node_or_ignore(p);
        let f = defs.get(n.content);
        println!(
            "{:>6}  {:<14} day={:<2} night={:<2} param2={:#04x}",
            y,
            f.name,
            n.light(terrane_content::LightBank::Day, &*defs),
            n.light(terrane_content::LightBank::Night, &*defs),
            n.param2
        );
    }
    Ok(())
}

fn run(cli: &Cli, cfg: &Config, seconds: u64, radius: i32) -> Result<(), Box<dyn Error>> {
    let map = open_map(cli, cfg)?;
    let rt = Runtime::spawn(map, cfg.runtime.clone());
    let h = rt.handle();

    let blocks = block_box(V3::ZERO, radius, 1);
    match h.call(Command::Emerge { blocks, allow_generate: true }) {
        Some(Reply::Emerged(loaded)) => log::info!(target: "map", "{} blocks emerged", loaded.len()),
        Some(Reply::Failed(e)) => return Err(e.into()),
        _ => return Err("runtime stopped".into()),
    }

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        thread::sleep(Duration::from_secs(1));
        if let Some(Reply::Stats(s)) = h.call(Command::Stats) {
            log::info!(
                target: "map",
                "{} sectors, {} blocks, {} queued liquid nodes",
                s.sectors,
                s.blocks,
                s.liquid_queue
            );
        }
    }
    let stats = rt.shutdown();
    log::info!(
        target: "map",
        "stopped after {} ticks: {} commands, {} liquid changes, {} blocks unloaded",
        stats.ticks,
        stats.commands,
        stats.liquid_changed,
        stats.unloaded
    );
    Ok(())
}

fn center_of(v: Option<&Vec<i32>>) -> V3 {
    match v.map(|v| v.as_slice()) {
        Some([x, y, z]) => V3::new(*x, *y, *z),
        _ => V3::ZERO,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(&cli.world, cli.verbose, !cli.no_debug_file)?;
    let cfg = Config::resolve(cli.config.as_deref(), Path::new(&cli.world))?;

    match &cli.command {
        Cmd::Generate { radius, height, center } => {
            generate(&cli, &cfg, center_of(center.as_ref()), *radius, *height)
        }
        Cmd::Info => info(&cli, &cfg),
        Cmd::List { limit } => list(&cli, &cfg, *limit),
        Cmd::Column { x, z, y_min, y_max } => column(&cli, &cfg, *x, *z, *y_min, *y_max),
        Cmd::Run { seconds, radius } => run(&cli, &cfg, *seconds, *radius),
    }
}
