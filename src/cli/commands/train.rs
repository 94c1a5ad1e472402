//! Train command - Learn a racing policy on a track

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use super::{is_saved_track, load_track};
use crate::{
    adapters::MsgPackRepository,
    cli::output::{create_spinner, format_number, print_kv, print_section, print_stats_table},
    config::TrainingConfig,
    learning::{Algorithm, EpisodeReport, EpochReport, StartSelection},
    pipeline::{
        JsonlObserver, LogObserver, MetricsObserver, MetricsSummary, ProgressObserver,
        TrainingObserver, TrainingPipeline, TrainingResult,
    },
    ports::TrackRepository,
    racetrack::{CrashPolicy, Track},
};

#[derive(Parser, Debug)]
#[command(about = "Train a policy on a track", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Text grid, or a saved track to continue training
    pub track: PathBuf,

    /// Learning algorithm (value-iteration, q-learning or sarsa)
    #[arg(long, short = 'a')]
    pub algorithm: Option<Algorithm>,

    /// Collision handling when building from a text grid (stop or start)
    #[arg(long, default_value_t = CrashPolicy::StopBeforeWall)]
    pub crash_policy: CrashPolicy,

    /// JSON training configuration; flags below override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Saved track whose values seed this one before training
    #[arg(long)]
    pub warm_start: Option<PathBuf>,

    /// Output file for the trained track (defaults to `<track>-<algorithm>.msgpack`)
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for per-epoch JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub max_epochs: Option<usize>,

    /// Episodes per epoch (Q-Learning and SARSA)
    #[arg(long)]
    pub episodes_per_epoch: Option<usize>,

    /// Step cap per episode (Q-Learning and SARSA)
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Discount factor γ in (0, 1]
    #[arg(long)]
    pub discount: Option<f64>,

    /// Exploration rate ε in [0, 1]
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Learning rate decay constant τ
    #[arg(long)]
    pub tau: Option<f64>,

    /// Convergence threshold on the change of sum|V|
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Probability that the chosen acceleration is applied (Value Iteration)
    #[arg(long)]
    pub success_probability: Option<f64>,

    /// Episode start selection (random or best)
    #[arg(long)]
    pub start_selection: Option<StartSelection>,

    /// Clear learned values before training
    #[arg(long, default_value_t = false)]
    pub reset: bool,
}

impl TrainArgs {
    /// Layer the command-line overrides over the configuration file.
    fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => TrainingConfig::default(),
        };

        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(epochs) = self.max_epochs {
            config.max_epochs = epochs;
        }
        if let Some(episodes) = self.episodes_per_epoch {
            config.episodes_per_epoch = episodes;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps_per_episode = steps;
        }
        if let Some(discount) = self.discount {
            config.discount = discount;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        if let Some(tau) = self.tau {
            config.tau = tau;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(probability) = self.success_probability {
            config.success_probability = probability;
        }
        if let Some(selection) = self.start_selection {
            config.start_selection = selection;
        }
        if self.reset {
            config.reset = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn output_path(&self, algorithm: Algorithm) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = self
            .track
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("track");
        self.track
            .with_file_name(format!("{stem}-{algorithm}"))
            .with_extension("msgpack")
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    result: &'a TrainingResult,
    metrics: MetricsSummary,
    config: &'a TrainingConfig,
    states: usize,
    actions: usize,
}

/// Hands metrics to the pipeline while keeping them readable afterwards.
struct SharedMetrics {
    inner: Arc<Mutex<MetricsObserver>>,
}

impl SharedMetrics {
    fn observer(&self) -> MutexGuard<'_, MetricsObserver> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TrainingObserver for SharedMetrics {
    fn on_episode_end(&mut self, epoch: usize, episode: &EpisodeReport) -> crate::Result<()> {
        self.observer().on_episode_end(epoch, episode)
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> crate::Result<()> {
        self.observer().on_epoch_end(report)
    }
}

fn build_track(args: &TrainArgs) -> Result<Track> {
    let spinner = create_spinner(&format!("Building track from {}", args.track.display()))?;
    let track = load_track(&args.track, args.crash_policy);
    spinner.finish_and_clear();
    let mut track = track?;

    if let Some(previous) = &args.warm_start {
        let previous = MsgPackRepository::new()
            .load(previous)
            .with_context(|| format!("Failed to load warm start {}", previous.display()))?;
        if track.warm_start_from(&previous) == 0 {
            log::warn!(
                "warm start from '{}' matched no action edges of '{}'",
                previous.name(),
                track.name()
            );
        }
    }
    Ok(track)
}

fn write_summary(path: &Path, summary: &TrainingSummaryFile<'_>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file {}", path.display()))?;
    to_writer_pretty(file, summary)?;
    Ok(())
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = args.training_config()?;
    let mut track = build_track(&args)?;
    if is_saved_track(&args.track) && !track.history().is_empty() && !config.reset {
        log::info!(
            "continuing '{}' from {} recorded epochs",
            track.name(),
            track.history().len()
        );
    }

    print_section(&format!(
        "Training '{}' with {}",
        track.name(),
        config.algorithm
    ));
    print_stats_table(&[
        ("States", format_number(track.states().len())),
        ("Action edges", format_number(track.actions().len())),
        ("Crash policy", track.crash_policy().to_string()),
        ("Discount", config.discount.to_string()),
        ("Max epochs", format_number(config.max_epochs)),
    ]);

    let metrics = Arc::new(Mutex::new(MetricsObserver::new()));
    let mut pipeline = TrainingPipeline::new(config.clone())
        .with_observer(Box::new(LogObserver::default()))
        .with_observer(Box::new(SharedMetrics {
            inner: Arc::clone(&metrics),
        }));
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create observations file {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let result = pipeline.run(&mut track)?;
    let metrics = metrics
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .summary();

    print_section("Training Complete");
    print_kv("Epochs", &format_number(result.epochs));
    if result.episodes > 0 {
        print_kv("Episodes", &format_number(result.episodes));
        print_kv(
            "Finish rate",
            &format!("{:.1}%", metrics.finish_rate * 100.0),
        );
        print_kv(
            "Avg episode",
            &format!("{:.1} steps", metrics.avg_episode_length),
        );
    }
    print_kv("Converged", &result.converged.to_string());
    if let Some(delta) = result.final_delta {
        print_kv("Final delta", &format!("{delta:.6}"));
    }
    print_kv("sum|V|", &format!("{:.4}", result.final_aggregate));

    let output = args.output_path(config.algorithm);
    MsgPackRepository::new()
        .save(&track, &output)
        .with_context(|| format!("Failed to save trained track to {}", output.display()))?;
    println!("\nSaved trained track to {}", output.display());

    if let Some(path) = &args.summary {
        let summary = TrainingSummaryFile {
            result: &result,
            metrics,
            config: &config,
            states: track.states().len(),
            actions: track.actions().len(),
        };
        write_summary(path, &summary)?;
        println!("Saved training summary to {}", path.display());
    }
    Ok(())
}
