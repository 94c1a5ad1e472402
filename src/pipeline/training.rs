//! Training pipeline: the shared epoch loop for all learners.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    config::TrainingConfig,
    learning::{Algorithm, Learner, build_rng},
    ports::TrainingObserver,
    racetrack::Track,
};

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Name of the trained track
    pub track: String,

    pub algorithm: Algorithm,

    /// Epochs run in this call
    pub epochs: usize,

    /// TD episodes run in this call (zero for Value Iteration)
    pub episodes: usize,

    /// Whether the convergence threshold was reached before the epoch cap
    pub converged: bool,

    /// Last convergence delta, `None` while fewer than two epochs are recorded
    pub final_delta: Option<f64>,

    /// Last recorded `sum(|value|)`
    pub final_aggregate: f64,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Training pipeline for one algorithm on one track
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn TrainingObserver>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `track` in place until convergence or the epoch cap.
    ///
    /// The configuration and the track's terminals are validated before any
    /// value changes. TD learners seed untrained q-values with small negative
    /// noise; a track that already carries history continues from its
    /// current values unless `reset` is set.
    pub fn run(&mut self, track: &mut Track) -> Result<TrainingResult> {
        self.config.validate()?;
        track.validate()?;

        let algorithm = self.config.algorithm;
        if self.config.reset {
            track.reset_values();
        }
        if algorithm.is_episodic() && track.history().is_empty() {
            let mut rng = build_rng(self.config.seed.map(|seed| seed.wrapping_add(1)));
            track.seed_q_values(&mut rng, self.config.q_init_scale);
        }

        log::info!(
            "training track '{}' with {algorithm} (discount {}, max {} epochs)",
            track.name(),
            self.config.discount,
            self.config.max_epochs
        );
        for observer in &mut self.observers {
            observer.on_training_start(algorithm, self.config.max_epochs)?;
        }

        let mut learner = Learner::from_config(&self.config);
        let mut epochs = 0;
        let mut episodes = 0;
        let mut converged = false;
        let mut final_delta = track.check_convergence();

        for _ in 0..self.config.max_epochs {
            let epoch = track.history().len();
            let observers = &mut self.observers;
            let report = learner.run_epoch(track, |episode| {
                for observer in observers.iter_mut() {
                    observer.on_episode_end(epoch, episode)?;
                }
                Ok(())
            })?;

            epochs += 1;
            episodes += report.episodes;
            final_delta = report.delta;
            for observer in &mut self.observers {
                observer.on_epoch_end(&report)?;
            }

            if report.delta < self.config.threshold {
                converged = true;
                break;
            }
        }

        if converged {
            log::info!(
                "{algorithm} converged on '{}' after {epochs} epochs (delta {final_delta:.6})",
                track.name()
            );
        } else {
            log::warn!(
                "{algorithm} reached the {} epoch cap on '{}' without converging (delta {final_delta:.6})",
                self.config.max_epochs,
                track.name()
            );
        }
        let final_delta = final_delta.is_finite().then_some(final_delta);

        let result = TrainingResult {
            track: track.name().to_string(),
            algorithm,
            epochs,
            episodes,
            converged,
            final_delta,
            final_aggregate: track
                .history()
                .samples()
                .last()
                .map_or(0.0, |sample| sample.aggregate_value),
        };

        for observer in &mut self.observers {
            observer.on_training_end(&result)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        racetrack::{CellType, CrashPolicy, Grid},
    };

    fn square() -> Track {
        let grid = Grid::from_rows(&["S..", "...", "..F"]).unwrap();
        Track::build("square", grid, CrashPolicy::StopBeforeWall).unwrap()
    }

    #[test]
    fn test_value_iteration_pipeline_converges() {
        let mut track = square();
        let mut pipeline = TrainingPipeline::new(TrainingConfig::new(Algorithm::ValueIteration));
        let result = pipeline.run(&mut track).unwrap();

        assert!(result.converged);
        assert_eq!(result.episodes, 0);
        assert_eq!(result.epochs, track.history().len());
        assert!(result.final_delta.unwrap() < 0.001);
    }

    #[test]
    fn test_td_pipeline_respects_epoch_cap() {
        let mut track = square();
        let config = TrainingConfig::new(Algorithm::Sarsa)
            .with_max_epochs(3)
            .with_threshold(0.0)
            .with_seed(11);
        let result = TrainingPipeline::new(config).run(&mut track).unwrap();

        assert!(!result.converged);
        assert_eq!(result.epochs, 3);
        assert_eq!(result.episodes, 3 * 11);
        assert_eq!(track.history().len(), 3);
    }

    #[test]
    fn test_invalid_config_leaves_track_untouched() {
        let mut track = square();
        let config = TrainingConfig::new(Algorithm::QLearning).with_epsilon(2.0);
        let err = TrainingPipeline::new(config).run(&mut track).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(track.history().is_empty());
    }

    #[test]
    fn test_missing_terminals_stop_training_before_learning() {
        let cases = [
            (["S.."], CellType::Finish, Algorithm::Sarsa),
            (["..F"], CellType::Start, Algorithm::QLearning),
            (["S.."], CellType::Finish, Algorithm::ValueIteration),
        ];
        for (rows, missing, algorithm) in cases {
            let grid = Grid::from_rows(&rows).unwrap();
            let mut track = Track::build("open", grid, CrashPolicy::StopBeforeWall).unwrap();
            let untouched = track.clone();

            let err = TrainingPipeline::new(TrainingConfig::new(algorithm))
                .run(&mut track)
                .unwrap_err();
            assert!(
                matches!(err, Error::MissingTerminal { cell } if cell == missing),
                "{algorithm}: {err}"
            );
            assert!(track.history().is_empty());
            assert_eq!(track, untouched);
        }
    }

    #[test]
    fn test_result_json_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        let result = TrainingResult {
            track: "square".to_string(),
            algorithm: Algorithm::QLearning,
            epochs: 4,
            episodes: 44,
            converged: true,
            final_delta: Some(0.0005),
            final_aggregate: 120.5,
        };
        result.save(&path).unwrap();
        assert_eq!(TrainingResult::load(&path).unwrap(), result);
    }
}
