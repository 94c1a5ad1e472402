//! Racetrack CLI - train and evaluate racing policies on grid tracks
//!
//! - Training with Value Iteration, Q-Learning or SARSA
//! - Evaluating the greedy policy under noisy acceleration
//! - Inspecting track layouts and table sizes
//! - Exporting learned tables as CSV

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "racetrack")]
#[command(version, about = "Reinforcement learning on racetrack grids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a policy with Value Iteration, Q-Learning or SARSA
    Train(Box<racetrack::cli::commands::train::TrainArgs>),

    /// Evaluate the greedy policy of a trained track
    Evaluate(racetrack::cli::commands::evaluate::EvaluateArgs),

    /// Print a track's layout and table sizes
    Inspect(racetrack::cli::commands::inspect::InspectArgs),

    /// Export learned tables as CSV
    Export(racetrack::cli::commands::export::ExportArgs),
}

fn init_logging() {
    env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init()
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => racetrack::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => racetrack::cli::commands::evaluate::execute(args),
        Commands::Inspect(args) => racetrack::cli::commands::inspect::execute(args),
        Commands::Export(args) => racetrack::cli::commands::export::execute(args),
    }
}
