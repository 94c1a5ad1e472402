//! Evaluate command - Drive a trained policy under stochastic acceleration

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use super::load_track;
use crate::{
    cli::output::{format_number, print_kv, print_section, print_subsection},
    config::EvaluationConfig,
    evaluation::{EpisodeOutcome, StepSummary, evaluate_policy},
    racetrack::CrashPolicy,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate the greedy policy of a trained track")]
pub struct EvaluateArgs {
    /// Saved MessagePack track
    pub track: PathBuf,

    /// JSON evaluation configuration; flags below override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of evaluation episodes
    #[arg(long, short = 'n')]
    pub episodes: Option<usize>,

    /// Step cap per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Probability that the chosen acceleration is applied
    #[arg(long)]
    pub success_probability: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Collision handling when building from a text grid (stop or start)
    #[arg(long, default_value_t = CrashPolicy::StopBeforeWall)]
    pub crash_policy: CrashPolicy,

    /// Export the summary and every episode outcome as JSON
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl EvaluateArgs {
    fn evaluation_config(&self) -> Result<EvaluationConfig> {
        let mut config = match &self.config {
            Some(path) => EvaluationConfig::from_json_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => EvaluationConfig::default(),
        };
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = steps;
        }
        if let Some(probability) = self.success_probability {
            config.success_probability = probability;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct EvaluationExport<'a> {
    track: &'a str,
    config: &'a EvaluationConfig,
    summary: Option<StepSummary>,
    outcomes: &'a [EpisodeOutcome],
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let config = args.evaluation_config()?;
    let track = load_track(&args.track, args.crash_policy)?;
    if track.history().is_empty() {
        log::warn!(
            "track '{}' has no training history; evaluating an untrained policy",
            track.name()
        );
    }

    let outcomes = evaluate_policy(&track, &config)?;
    let summary = StepSummary::from_outcomes(&outcomes);

    print_section(&format!("Evaluation of '{}'", track.name()));
    print_kv("Episodes", &format_number(config.episodes));
    print_kv("Step cap", &format_number(config.max_steps));
    print_kv(
        "Success prob.",
        &format!("{:.2}", config.success_probability),
    );

    if let Some(summary) = &summary {
        print_subsection("Steps to finish");
        print_kv(
            "Finished",
            &format!(
                "{}/{} ({:.1}%)",
                summary.finished,
                summary.episodes,
                summary.finished as f64 / summary.episodes as f64 * 100.0
            ),
        );
        print_kv("Min", &summary.min.to_string());
        print_kv("Max", &summary.max.to_string());
        print_kv("Mean", &format!("{:.2}", summary.mean));
        print_kv("Trimmed mean", &format!("{:.2}", summary.trimmed_mean));
    }

    if let Some(path) = &args.export {
        let export = EvaluationExport {
            track: track.name(),
            config: &config,
            summary,
            outcomes: &outcomes,
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &export)?;
        println!("\nExported evaluation to {}", path.display());
    }
    Ok(())
}
