//! CLI for klickwahl.
//!
//! `train` reads historical interactions (JSON Lines), trains the epsilon-greedy
//! bandit and writes the policy state. `select` loads that state and prints the
//! recommended item for one context. The two commands never run concurrently
//! against the same state file.

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand};
use klickwahl_bandits::{save_state, select_item, Trainer, TrainingSet, DEFAULT_EPSILON};
use klickwahl_core::{Context, Interaction};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the policy state file
    #[arg(
        long,
        global = true,
        env = "KLICKWAHL_STATE_FILE",
        default_value = "data/klickwahl.state.json"
    )]
    state_file: PathBuf,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// No log output at all
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model from historical interactions and save it
    Train {
        /// JSON Lines file with interactions (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Simulated trials per context (default: 10000)
        #[arg(long, default_value = "10000")]
        trials: u32,

        /// Exploration rate used during training
        #[arg(long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,

        /// Seed for reproducible training runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Load the saved model and recommend an item for one context
    Select {
        /// User ID
        #[arg(long, default_value = "")]
        user: String,

        /// Time of day [morning|afternoon|evening|night]
        #[arg(long, default_value = "")]
        time: String,

        /// Weekday [monday..sunday]
        #[arg(long, default_value = "")]
        weekday: String,

        /// Device
        #[arg(long, default_value = "")]
        device: String,

        /// Exploration rate. Serving always uses 0.1, the rate the model was
        /// trained with; other values are for debugging only
        #[arg(long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,

        /// Seed for a reproducible choice
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = match verbose {
        0 => "warn,klickwahl=info,klickwahl_bandits=info",
        1 => "info,klickwahl=debug,klickwahl_bandits=debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Reads all interactions before training starts. Blank lines are skipped,
/// a malformed line aborts the whole read.
fn read_interactions(reader: impl BufRead) -> Result<Vec<Interaction>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Interaction = serde_json::from_str(&line)
            .with_context(|| format!("Invalid interaction on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn fetch_interactions(input: Option<&Path>) -> Result<Vec<Interaction>> {
    match input {
        Some(path) => {
            let f = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            read_interactions(BufReader::new(f))
        }
        None => read_interactions(io::stdin().lock()),
    }
}

fn run_train(
    input: Option<&Path>,
    state_file: &Path,
    trials: u32,
    epsilon: f64,
    seed: Option<u64>,
) -> Result<()> {
    let records = fetch_interactions(input).context("Failed to fetch training data")?;
    let set = TrainingSet::from_interactions(records);
    let (records, arms, contexts) = (set.record_count(), set.arms().len(), set.contexts().len());

    let trainer = Trainer {
        epsilon,
        trials_per_context: trials,
    };
    info!("Training...");
    let state = trainer
        .train(set, &mut make_rng(seed))
        .context("Training failed")?;

    info!("Saving model as {}", state_file.display());
    save_state(&state, state_file)
        .with_context(|| format!("Failed to save state to {}", state_file.display()))?;

    println!(
        "Trained {} contexts over {} arms from {} records. State saved to {}",
        contexts,
        arms,
        records,
        state_file.display()
    );
    Ok(())
}

fn run_select(state_file: &Path, ctx: &Context, epsilon: f64, seed: Option<u64>) -> Result<String> {
    info!("Loading model from {}", state_file.display());
    let item = select_item(state_file, ctx, epsilon, &mut make_rng(seed))
        .with_context(|| format!("Failed to select an item from {}", state_file.display()))?;
    info!("Recommend item: {}", item);
    Ok(item)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train {
            input,
            trials,
            epsilon,
            seed,
        } => run_train(input.as_deref(), &cli.state_file, trials, epsilon, seed)?,
        Commands::Select {
            user,
            time,
            weekday,
            device,
            epsilon,
            seed,
        } => {
            let ctx = Context::new(user, time, weekday, device);
            let item = run_select(&cli.state_file, &ctx, epsilon, seed)?;
            println!("{item}");
        }
    }

    Ok(())
}
