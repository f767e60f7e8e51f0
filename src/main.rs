use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zone_generator::ascii;
use zone_generator::content::{populate_zone, ContentRegistry, PopulationOutcome, SpawnTableRegistry};
use zone_generator::delta::{DeltaStorage, DeltaStore};
use zone_generator::exploration::{TickOutcome, ZoneActivity};
use zone_generator::export;
use zone_generator::interaction::{unlock_gate, InteractionOutcome, MessageLog};
use zone_generator::tilemap::Coord;
use zone_generator::zone::ZoneKind;
use zone_generator::{build_zone, EngineConfig, ZoneDefinition, ZoneError, ZoneResult};

#[derive(Parser, Debug)]
#[command(name = "zone_generator")]
#[command(about = "Generate, populate and explore procedural zones")]
struct Args {
    /// World-tile seed every random stream derives from
    #[arg(short, long, default_value = "world")]
    seed: String,

    /// Zone id (also picks the zone out of --definition)
    #[arg(short, long, default_value = "cave_1")]
    zone_id: String,

    /// JSON array of zone definitions; without it a cellular cave is generated
    #[arg(short, long)]
    definition: Option<PathBuf>,

    /// Width override for generated zones
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height override for generated zones
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Initial wall probability override
    #[arg(long)]
    fill: Option<f64>,

    /// Smoothing pass count override
    #[arg(long)]
    smooth: Option<usize>,

    /// JSON spawn tables keyed by template or zone id
    #[arg(long)]
    spawn_tables: Option<PathBuf>,

    /// JSON array of content definitions
    #[arg(long)]
    content_defs: Option<PathBuf>,

    /// Delta file, loaded before and saved after the run
    #[arg(long)]
    deltas: Option<PathBuf>,

    /// Number of exploration ticks to run
    #[arg(long, default_value = "0")]
    explore: usize,

    /// Walk the player to a known tile, given as x,y
    #[arg(long, value_parser = parse_coord)]
    walk_to: Option<Coord>,

    /// Sleep between ticks and redraw the map
    #[arg(long)]
    animate: bool,

    /// Open the zone's locked region
    #[arg(long)]
    unlock: bool,

    /// Forget this zone's saved deltas before applying them
    #[arg(long)]
    reset: bool,

    /// Print the glyph legend under the map
    #[arg(long)]
    legend: bool,

    /// Hide unexplored tiles in the printed map
    #[arg(long)]
    fog: bool,

    /// ANSI colors in the printed map
    #[arg(long)]
    color: bool,

    /// Export the zone as PNG
    #[arg(long)]
    export_png: Option<PathBuf>,

    /// Pixels per tile for PNG export
    #[arg(long, default_value = "8")]
    scale: u32,

    /// Export a text snapshot of the zone
    #[arg(long)]
    export_txt: Option<PathBuf>,

    /// Engine config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Prints interaction messages to stdout.
struct ConsoleLog;

impl MessageLog for ConsoleLog {
    fn message(&mut self, text: &str) {
        println!("> {}", text);
    }
}

fn parse_coord(s: &str) -> Result<Coord, String> {
    let (x, y) = s.split_once(',').ok_or("expected x,y")?;
    let x = x.trim().parse().map_err(|_| format!("bad x: {}", x))?;
    let y = y.trim().parse().map_err(|_| format!("bad y: {}", y))?;
    Ok(Coord::new(x, y))
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn load_definition(args: &Args, config: &EngineConfig) -> ZoneResult<ZoneDefinition> {
    let mut definition = match &args.definition {
        Some(path) => ZoneDefinition::list_from_json(&fs::read_to_string(path)?)?
            .into_iter()
            .find(|d| d.id == args.zone_id)
            .ok_or_else(|| ZoneError::UnknownZone(args.zone_id.clone()))?,
        None => ZoneDefinition::generated(args.zone_id.as_str(), config.generator.clone()),
    };

    if definition.kind == ZoneKind::Generated {
        if args.width.is_some() {
            definition.width = args.width;
        }
        if args.height.is_some() {
            definition.height = args.height;
        }
        let generator = definition
            .generator_config
            .get_or_insert_with(|| config.generator.clone());
        if let Some(fill) = args.fill {
            generator.fill_chance = fill;
        }
        if let Some(smooth) = args.smooth {
            generator.smooth_iterations = smooth;
        }
    }
    Ok(definition)
}

fn print_map(zone: &zone_generator::Zone, fog: bool, color: bool) {
    if color {
        print!("{}", ascii::render_zone_colored(zone, fog));
    } else {
        print!("{}", ascii::render_zone(zone, fog));
    }
}

fn run(args: Args) -> ZoneResult<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    init_logging(&config.log_filter);

    let definition = load_definition(&args, &config)?;
    info!(zone_id = %definition.id, seed = %args.seed, "building zone");
    let mut zone = build_zone(&definition, &args.seed)?;

    if let Some(path) = &args.spawn_tables {
        let tables = SpawnTableRegistry::from_json(&fs::read_to_string(path)?)?;
        let definitions = match &args.content_defs {
            Some(path) => ContentRegistry::from_json(&fs::read_to_string(path)?)?,
            None => ContentRegistry::new(),
        };
        if let PopulationOutcome::Populated(counts) =
            populate_zone(&mut zone, &tables, &definitions, config.spawn_base_tiles)
        {
            for (kind, n) in counts {
                println!("Placed {} {}", n, kind);
            }
        }
    }

    let storage = args.deltas.as_ref().map(DeltaStorage::new);
    let mut deltas = match &storage {
        Some(storage) => storage.load()?,
        None => DeltaStore::new(),
    };
    if !deltas.is_empty() {
        info!(zones = ?deltas.zone_ids().collect::<Vec<_>>(), "deltas loaded");
    }
    if args.reset && deltas.clear_zone(&zone.id) {
        println!("Cleared saved state for {}.", zone.id);
    }
    let report = deltas.apply_deltas(&mut zone);
    if report != Default::default() {
        info!(report = ?report, "restored saved state");
    }
    zone.enter();

    if args.unlock {
        let outcome = unlock_gate(&mut zone, &mut deltas, &mut ConsoleLog);
        if outcome == InteractionOutcome::NoLockedRegion {
            println!("This zone has no locked region.");
        }
    }

    if args.explore > 0 {
        let mut activity = ZoneActivity::explore(&zone);
        for _ in 0..args.explore {
            let outcome = activity.tick(&mut zone, &mut deltas, &mut ());
            if args.animate {
                thread::sleep(Duration::from_millis(config.explore_tick_ms));
                if let TickOutcome::Revealed(_) = outcome {
                    print!("\x1b[2J\x1b[H");
                    print_map(&zone, true, args.color);
                }
            }
            if activity.is_idle() {
                break;
            }
        }
        activity.cancel(&mut zone);
    }

    if let Some(target) = args.walk_to {
        match ZoneActivity::walk_to(&zone, target) {
            Some(mut activity) => {
                while !activity.is_idle() {
                    let outcome = activity.tick(&mut zone, &mut deltas, &mut ());
                    if args.animate {
                        thread::sleep(Duration::from_millis(config.move_tick_ms));
                        if let TickOutcome::Stepped(_) | TickOutcome::Arrived(_) = outcome {
                            print!("\x1b[2J\x1b[H");
                            print_map(&zone, true, args.color);
                        }
                    }
                }
            }
            None => println!("No known path to {}.", target),
        }
    }

    if let Some(storage) = &storage {
        storage.save(&deltas)?;
    }

    print_map(&zone, args.fog, args.color);
    if args.legend {
        println!();
        println!("{}", ascii::legend());
    }
    println!();
    println!("Zone: {} ({}x{})", zone.name, zone.width(), zone.height());
    println!("Entry spawn: {}", zone.entry_spawn);
    println!("Locked regions: {}", zone.locked_regions.len());
    println!("Explored: {}/{}", zone.explored_count(), zone.explorable_count());
    println!("Content: {} instances", zone.content.len());

    if let Some(path) = &args.export_png {
        export::export_zone_png(&zone, path, args.scale)?;
        println!("Exported PNG to {}", path.display());
    }
    if let Some(path) = &args.export_txt {
        ascii::export_zone_file(&zone, path)?;
        println!("Exported text snapshot to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
