use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use swerve::simulation::evolution::Evolution;
use swerve::simulation::params::Params;
use swerve::simulation::selection::permutations;
use swerve::simulation::solo::SoloRun;

#[derive(Parser)]
#[command(name = "swerve")]
#[command(about = "Cars that learn to steer around obstacles", long_about = None)]
struct Cli {
    /// JSON parameter file; missing fields use defaults
    #[arg(short, long, global = true)]
    params: Option<PathBuf>,

    /// Random seed
    #[arg(short, long, global = true, default_value_t = 0)]
    seed: u64,

    /// Directory holding weight bundles
    #[arg(short, long, global = true)]
    weights: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a single car until it crashes
    Solo {
        /// Stop after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u64,
    },
    /// Evolve a population of cars
    Evolve {
        /// Generations to run
        #[arg(short, long, default_value_t = 10)]
        generations: u32,

        /// Stop after this many ticks
        #[arg(long, default_value_t = 1_000_000)]
        max_ticks: u64,

        /// Write the best surviving car's weights to the weights directory
        #[arg(long)]
        export_best: bool,
    },
    /// Print every permutation of 1..=depth
    Permute {
        /// Permutation length
        #[arg(default_value_t = 3)]
        depth: usize,
    },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();

    let params = match &cli.params {
        Some(path) => Params::load_from_file(path)
            .with_context(|| format!("failed to load params from {}", path.display()))?,
        None => Params::default(),
    };
    params.validate().context("invalid params")?;

    match cli.command {
        Commands::Solo { max_ticks } => {
            let mut run = SoloRun::new(params, cli.seed, cli.weights);
            let ticks = run.run(max_ticks);
            println!("ticks: {ticks}, score: {:.1}", run.score);
        }
        Commands::Evolve {
            generations,
            max_ticks,
            export_best,
        } => {
            let mut evolution = Evolution::new(params, cli.seed, cli.weights.clone());
            let ticks = evolution.run(generations, max_ticks);
            info!(ticks, generation = evolution.generation, "evolution stopped");

            for summary in &evolution.history {
                let best = summary
                    .best_fitness
                    .map_or_else(|| "-".to_string(), |f| format!("{f:.1}"));
                println!(
                    "generation {:>4}: {:>6} ticks, best fitness {:>10}, fallbacks {}",
                    summary.generation, summary.ticks, best, summary.fallbacks
                );
            }

            if export_best {
                let dir = cli
                    .weights
                    .context("--export-best needs a weights directory")?;
                let best = evolution
                    .best_car()
                    .context("no live car to export")?;
                let path = best.to_bundle().save(&dir)?;
                println!("exported car {} to {}", best.id, path.display());
            }
        }
        Commands::Permute { depth } => {
            for perm in permutations(depth) {
                println!("{perm:?}");
            }
        }
    }

    Ok(())
}
