//! Headless Gridworld Runner
//!
//! Drives a registry with a seeded random policy and prints a JSON summary
//! of the episode.

use clap::{Parser, ValueEnum};
use gridworld::render::ascii_frame;
use gridworld::{Direction, Event, GameConfig, Operation, Registry, Result};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Game {
    /// Build the value of an arithmetic equation out of blocks
    Equation,
    /// Place one block under each target
    Targets,
}

/// Headless Gridworld Runner - random policy episodes
#[derive(Parser, Debug)]
#[command(name = "gridworld")]
#[command(about = "Run a seeded random policy against the grid registry")]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs (overrides the config seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum steps before the episode is cut off
    #[arg(long, default_value_t = 500)]
    steps: usize,

    /// Which episode type to reset into
    #[arg(long, value_enum, default_value = "targets")]
    game: Game,

    /// Print a text frame of the final grid to stderr
    #[arg(long)]
    ascii: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct EpisodeSummary {
    game: Game,
    seed: u64,
    steps: usize,
    outcome: Option<Event>,
    reward: f32,
    targ_val: u32,
    block_sum: u32,
    n_blocks: usize,
    n_targs: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridworld=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let seed = args
        .seed
        .or(config.seed)
        .unwrap_or_else(|| rand::random());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(seed, game = ?args.game, "starting episode");

    let mut registry = Registry::new(config.clone())?;
    match args.game {
        Game::Equation => {
            let left = rng.gen_range(1..=20);
            let right = rng.gen_range(1..=20);
            let op = match rng.gen_range(0..3) {
                0 => Operation::Add,
                1 => Operation::Subtract,
                _ => Operation::Multiply,
            };
            registry.reset_equation(left, op, right, &mut rng)?;
        }
        Game::Targets => {
            let n = rng.gen_range(config.targets.min..=config.targets.max);
            registry.reset_targets(n, config.targets.layout, &mut rng)?;
        }
    }

    let mut outcome = None;
    let mut steps = 0;
    while steps < args.steps {
        let direction = Direction::from_index(rng.gen_range(0..Direction::ALL.len()));
        let grab = rng.gen_bool(0.5);
        let event = registry.step(direction, grab);
        steps += 1;
        if event.is_terminal() {
            tracing::info!(?event, steps, "episode ended");
            outcome = Some(event);
            break;
        }
    }

    let reward = match outcome {
        Some(Event::Full) => registry.full_grid_penalty(),
        Some(Event::ButtonPress) if registry.block_sum() == registry.targ_val() => 1.0,
        Some(Event::ButtonPress) => -1.0,
        _ => 0.0,
    };

    if args.ascii {
        eprint!("{}", ascii_frame(registry.grid(), registry.objects()));
    }

    let summary = EpisodeSummary {
        game: args.game,
        seed,
        steps,
        outcome,
        reward,
        targ_val: registry.targ_val(),
        block_sum: registry.block_sum(),
        n_blocks: registry.n_blocks(),
        n_targs: registry.n_targs(),
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!(error = %e, "failed to serialize summary"),
    }
    Ok(())
}
