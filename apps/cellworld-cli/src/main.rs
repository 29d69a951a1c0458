mod scenario;
mod sim;

use anyhow::anyhow;
use cellworld_kernel::{ActorRegistry, MainThread, builtin};
use cellworld_tools::WorldInspector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;
use crate::sim::Simulation;

pub const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.yaml");

#[derive(Parser)]
#[command(name = "cellworld-cli", about = "Run cellworld simulation scenarios")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the built-in trait kinds
    Info,
    /// Run a scenario file
    Run {
        /// Path to a scenario YAML file
        scenario: PathBuf,
        /// Number of ticks to simulate (defaults to the scenario's)
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Seconds per tick (defaults to the scenario's)
        #[arg(short, long)]
        delta: Option<f32>,
        /// Print a text frame after every tick
        #[arg(short, long)]
        frames: bool,
    },
    /// Run the bundled demo scenario
    Demo {
        /// Number of ticks to simulate
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Print a text frame after every tick
        #[arg(short, long)]
        frames: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let mut registry = ActorRegistry::new();
            builtin::register_builtin_traits(&mut registry)?;
            let demo = Scenario::parse(DEMO_SCENARIO)?;

            println!("cellworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("trait kinds: {}", registry.trait_kinds().collect::<Vec<_>>().join(", "));
            println!(
                "demo: {} ({}x{} map, {} templates, {} spawns)",
                demo.title(),
                demo.map.width,
                demo.map.height,
                demo.actors.len(),
                demo.spawns.len()
            );
        }
        Commands::Run {
            scenario,
            ticks,
            delta,
            frames,
        } => {
            let scenario = Scenario::load(&scenario)?;
            run(scenario, ticks, delta, frames)?;
        }
        Commands::Demo { ticks, frames } => {
            run(Scenario::parse(DEMO_SCENARIO)?, ticks, None, frames)?;
        }
    }

    Ok(())
}

/// Simulate on a worker thread. The world never leaves that thread; frames
/// are handed to this thread for printing.
fn run(scenario: Scenario, ticks: Option<u64>, delta: Option<f32>, frames: bool) -> anyhow::Result<()> {
    let ticks = ticks.unwrap_or(scenario.ticks);
    let delta = delta.unwrap_or(scenario.delta);
    println!("{}: {ticks} ticks of {delta}s", scenario.title());

    let main_thread = MainThread::new();
    let output = main_thread.handle();
    let worker = thread::Builder::new()
        .name("simulation".into())
        .spawn(move || -> anyhow::Result<String> {
            let mut sim = Simulation::new(scenario)?;
            for _ in 0..ticks {
                sim.step(delta)?;
                if frames {
                    let frame = sim.frame()?;
                    output.run(move || print!("{frame}"))?;
                }
            }
            let summary = WorldInspector::summary(sim.world());
            let grid = WorldInspector::occupancy_grid(sim.world());
            Ok(format!("{summary}\n{grid}"))
        })?;

    main_thread.run_until_closed();
    let report = worker
        .join()
        .map_err(|_| anyhow!("simulation thread panicked"))??;
    print!("{report}");
    Ok(())
}
