//! Observer implementations for training pipelines
//!
//! Observers collect progress and metrics during training without coupling
//! the epoch loop to any output format.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::training::TrainingResult;
use crate::{
    Result,
    learning::{Algorithm, EpisodeReport, EpochReport},
    ports::TrainingObserver,
};

/// Progress bar observer - one tick per epoch, latest delta as the message
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    finished_episodes: usize,
    episodes: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            finished_episodes: 0,
            episodes: 0,
        }
    }

    fn message(&self, delta: f64) -> String {
        if self.episodes == 0 {
            format!("delta {delta:.6}")
        } else {
            format!(
                "delta {delta:.6}, finished {}/{} episodes",
                self.finished_episodes, self.episodes
            )
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_training_start(&mut self, algorithm: Algorithm, max_epochs: usize) -> Result<()> {
        let pb = ProgressBar::new(max_epochs as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {prefix} {bar:40.cyan/blue} {pos}/{len} epochs ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        pb.set_prefix(algorithm.to_string());
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, _epoch: usize, episode: &EpisodeReport) -> Result<()> {
        self.episodes += 1;
        if episode.reached_finish {
            self.finished_episodes += 1;
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
            pb.set_message(self.message(report.delta));
        }
        Ok(())
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            let status = if result.converged {
                "converged"
            } else {
                "epoch cap reached"
            };
            pb.finish_with_message(status);
        }
        Ok(())
    }
}

/// Log observer - reports epochs through the `log` facade
#[derive(Debug, Clone)]
pub struct LogObserver {
    /// Log every n-th epoch at info level; the rest go to debug.
    every: usize,
}

impl LogObserver {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TrainingObserver for LogObserver {
    fn on_training_start(&mut self, algorithm: Algorithm, max_epochs: usize) -> Result<()> {
        log::info!("{algorithm}: starting, at most {max_epochs} epochs");
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        let level = if (report.epoch + 1).is_multiple_of(self.every) {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(
            level,
            "epoch {}: sum|V| = {:.4}, delta = {:.6}, episodes = {}",
            report.epoch,
            report.aggregate_value,
            report.delta,
            report.episodes
        );
        Ok(())
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        log::info!(
            "{}: {} epochs, {} episodes, converged: {}",
            result.algorithm,
            result.epochs,
            result.episodes,
            result.converged
        );
        Ok(())
    }
}

/// Metrics observer - collects per-epoch deltas and per-episode lengths
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    deltas: Vec<f64>,
    aggregates: Vec<f64>,
    episode_lengths: Vec<usize>,
    finished_episodes: usize,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn aggregates(&self) -> &[f64] {
        &self.aggregates
    }

    pub fn episode_lengths(&self) -> &[usize] {
        &self.episode_lengths
    }

    /// Fraction of episodes that reached the finish.
    pub fn finish_rate(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.finished_episodes as f64 / self.episode_lengths.len() as f64
        }
    }

    pub fn avg_episode_length(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            epochs: self.deltas.len(),
            episodes: self.episode_lengths.len(),
            finish_rate: self.finish_rate(),
            avg_episode_length: self.avg_episode_length(),
            last_aggregate: self.aggregates.last().copied(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub epochs: usize,
    pub episodes: usize,
    pub finish_rate: f64,
    pub avg_episode_length: f64,
    pub last_aggregate: Option<f64>,
}

impl TrainingObserver for MetricsObserver {
    fn on_episode_end(&mut self, _epoch: usize, episode: &EpisodeReport) -> Result<()> {
        self.episode_lengths.push(episode.steps);
        if episode.reached_finish {
            self.finished_episodes += 1;
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        self.deltas.push(report.delta);
        self.aggregates.push(report.aggregate_value);
        Ok(())
    }
}

/// JSONL observer - writes one JSON object per epoch
pub struct JsonlObserver {
    writer: BufWriter<File>,
    algorithm: Option<Algorithm>,
}

#[derive(Serialize)]
struct EpochLine {
    algorithm: Option<Algorithm>,
    epoch: usize,
    episodes: usize,
    aggregate_value: f64,
    /// `None` until two epochs are recorded
    delta: Option<f64>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            algorithm: None,
        })
    }
}

impl TrainingObserver for JsonlObserver {
    fn on_training_start(&mut self, algorithm: Algorithm, _max_epochs: usize) -> Result<()> {
        self.algorithm = Some(algorithm);
        Ok(())
    }

    fn on_epoch_end(&mut self, report: &EpochReport) -> Result<()> {
        let line = EpochLine {
            algorithm: self.algorithm,
            epoch: report.epoch,
            episodes: report.episodes,
            aggregate_value: report.aggregate_value,
            delta: report.delta.is_finite().then_some(report.delta),
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
