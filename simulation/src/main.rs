//! Frontier Simulation runner
//!
//! Runs the simulation headless for a number of turns and prints the
//! closing statistics.

use std::path::PathBuf;

use clap::Parser;
use simulation::{SimulationConfig, SimulationWorld};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "frontier", about = "Settler economy and demography simulation")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of turns (years) to run
    #[arg(short, long, default_value_t = 100)]
    turns: u32,

    /// Override the configured seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log every system at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    info!(
        size = config.world_size,
        population = config.initial_population,
        seed = config.seed,
        "Frontier simulation starting..."
    );
    let mut sim = SimulationWorld::new(config)?;
    info!(land = sim.geography().land_tiles().len(), "World generated");

    let start = std::time::Instant::now();
    for _ in 0..cli.turns {
        let summary = sim.advance_turn()?;
        if summary.population == 0 {
            info!(turn = summary.turn, "Population died out");
            break;
        }
    }
    let elapsed = start.elapsed();

    let stats = sim.statistics();
    info!(
        turns = sim.turn(),
        population = stats.population,
        average_age = stats.average_age,
        buildings = sim.buildings().len(),
        ?elapsed,
        "Simulation complete"
    );
    if cli.json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        for (occupation, count) in &stats.composition {
            println!("{:<14} {}", occupation.display_name(), count);
        }
        println!("{:<14} {}", "total", stats.population);
    }
    Ok(())
}
