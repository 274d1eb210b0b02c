//! Headless Move Runner
//!
//! Loads a scenario (or builds a seeded random one), carries out its moves
//! tick by tick and prints where every unit ended up.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

use voxel_tactics::core::error::Result;
use voxel_tactics::core::types::Heading;
use voxel_tactics::core::MovementConfig;
use voxel_tactics::scenario::{
    scatter_obstacles, Deployment, GridSpec, MoveSpec, Scenario, UnitSpec,
};
use voxel_tactics::tactics::{
    GridCoord, OrderStatus, SkirmishEvent, SkirmishEventType, UnitId, DEFAULT_MAP_DEPTH,
    DEFAULT_MAP_LEVELS, DEFAULT_MAP_WIDTH,
};

/// Headless Move Runner - execute scenario moves and report the outcome
#[derive(Parser, Debug)]
#[command(name = "move_runner")]
#[command(about = "Run tactical move orders on a scenario and report the results")]
struct Args {
    /// Scenario TOML file; a random map is generated when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Movement config TOML file, overriding the scenario's
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random map width in cells
    #[arg(long, default_value_t = DEFAULT_MAP_WIDTH)]
    width: u32,

    /// Random map depth in cells
    #[arg(long, default_value_t = DEFAULT_MAP_DEPTH)]
    depth: u32,

    /// Random map levels
    #[arg(long, default_value_t = DEFAULT_MAP_LEVELS)]
    levels: u32,

    /// Chance for each ground cell of the random map to hold a pillar
    #[arg(long, default_value_t = 0.2)]
    density: f64,

    /// Random seed for deterministic maps; with --scenario, scatters
    /// pillars over the loaded map as well
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = 0.1)]
    tick_seconds: f32,

    /// Maximum ticks before giving up
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Final state of one unit
#[derive(Serialize)]
struct UnitReport {
    name: String,
    start: GridCoord,
    position: GridCoord,
    heading: Heading,
    time_units: u32,
    max_time_units: u32,
    last_status: Option<OrderStatus>,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    scenario: String,
    seed: Option<u64>,
    ticks: u64,
    units: Vec<UnitReport>,
    unreachable: Vec<String>,
    events: Vec<SkirmishEvent>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "voxel_tactics=debug"
    } else {
        "voxel_tactics=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (mut scenario, seed) = match &args.scenario {
        Some(path) => (Scenario::load(path)?, args.seed),
        None => {
            let seed = args.seed.unwrap_or_else(|| rand::random());
            (random_scenario(&args), Some(seed))
        }
    };
    if let Some(path) = &args.config {
        scenario.movement = MovementConfig::load(path)?;
    }
    scenario.validate()?;

    let mut deployment = scenario.deploy()?;
    if let Some(seed) = seed {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placed = scatter_obstacles(
            &mut deployment.skirmish.grid,
            &mut rng,
            args.density,
            &scenario.reserved_cells(),
        );
        tracing::info!("Seed {}: scattered {} pillars", seed, placed);
    }

    let starts: Vec<(UnitId, GridCoord)> = deployment
        .skirmish
        .units()
        .iter()
        .map(|u| (u.id, u.position))
        .collect();
    let pending = scenario.planned_moves(&deployment)?;
    tracing::info!(
        "Running '{}': {} units, {} moves",
        scenario.name,
        starts.len(),
        pending.len()
    );

    let unreachable = run_moves(&mut deployment, pending, &args);

    let skirmish = &deployment.skirmish;
    let units = skirmish
        .units()
        .iter()
        .map(|unit| UnitReport {
            name: unit.name.clone(),
            start: starts
                .iter()
                .find(|(id, _)| *id == unit.id)
                .map(|(_, at)| *at)
                .unwrap_or(unit.position),
            position: unit.position,
            heading: unit.heading,
            time_units: unit.time_units.current(),
            max_time_units: unit.time_units.max(),
            last_status: skirmish.log.iter().rev().find_map(|e| match &e.event_type {
                SkirmishEventType::OrderFinished { status } if e.unit_id == unit.id => {
                    Some(*status)
                }
                _ => None,
            }),
        })
        .collect();

    let result = RunResult {
        scenario: scenario.name.clone(),
        seed,
        ticks: skirmish.tick,
        units,
        unreachable,
        events: skirmish.log.clone(),
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

/// Issue each move once its unit is idle, and tick until all are done.
/// Returns descriptions of the moves that could not be planned.
fn run_moves(
    deployment: &mut Deployment,
    mut pending: Vec<(UnitId, GridCoord)>,
    args: &Args,
) -> Vec<String> {
    let skirmish = &mut deployment.skirmish;
    let mut unreachable = Vec::new();

    while skirmish.tick < args.max_ticks {
        let mut i = 0;
        while i < pending.len() {
            let (unit_id, goal) = pending[i];
            if skirmish.has_order(unit_id) {
                i += 1;
                continue;
            }
            pending.remove(i);
            if let Err(e) = skirmish.issue_move(unit_id, goal) {
                let name = skirmish
                    .get_unit(unit_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_default();
                tracing::warn!("{} cannot move to {}: {}", name, goal, e);
                unreachable.push(format!("{} -> {}: {}", name, goal, e));
            }
        }

        if skirmish.is_idle() && pending.is_empty() {
            break;
        }
        for event in skirmish.tick(args.tick_seconds) {
            tracing::debug!("[{}] {}", event.tick, event.description);
        }
    }

    if !skirmish.is_idle() {
        tracing::warn!("Stopped after {} ticks with orders still running", skirmish.tick);
    }
    unreachable
}

/// One walker crossing the map corner to corner on flat ground
fn random_scenario(args: &Args) -> Scenario {
    let far = [args.width as i32 - 1, args.depth as i32 - 1, 0];
    Scenario {
        name: format!("random {}x{}x{}", args.width, args.depth, args.levels),
        grid: GridSpec {
            width: args.width,
            depth: args.depth,
            levels: args.levels,
        },
        movement: MovementConfig::default(),
        fills: Vec::new(),
        cells: Vec::new(),
        units: vec![UnitSpec {
            name: "Runner".into(),
            at: [0, 0, 0],
            time_units: None,
            can_fly: false,
            heading: 0.0,
        }],
        moves: vec![MoveSpec {
            unit: "Runner".into(),
            to: far,
        }],
    }
}

fn print_text(result: &RunResult) {
    println!("Move Result");
    println!("===========");
    println!("Scenario: {}", result.scenario);
    if let Some(seed) = result.seed {
        println!("Seed: {}", seed);
    }
    println!("Ticks: {}", result.ticks);
    println!();
    for unit in &result.units {
        println!(
            "{}: {} -> {} heading {:.2}, TU {}/{}, {:?}",
            unit.name,
            unit.start,
            unit.position,
            unit.heading,
            unit.time_units,
            unit.max_time_units,
            unit.last_status
        );
    }
    for line in &result.unreachable {
        println!("Unreachable: {}", line);
    }
}
