//! Learning algorithms over a [`Track`](crate::racetrack::Track).
//!
//! Value Iteration, Q-Learning and SARSA share one epoch structure and the
//! same value/convergence bookkeeping; they differ only in how q-values are
//! backed up within an epoch:
//!
//! | Algorithm | Epoch | Bootstrap target |
//! |-----------|-------|------------------|
//! | Value Iteration | one synchronous backup of every edge | expected next-state value |
//! | Q-Learning | a batch of sampled episodes | greedy successor edge |
//! | SARSA | a batch of sampled episodes | successor edge actually chosen |
//!
//! Every epoch ends with [`Track::update_state_values`] so the convergence
//! history grows by exactly one sample per epoch.

pub mod algorithm;
pub mod temporal_difference;
pub mod value_iteration;

pub use algorithm::{Algorithm, StartSelection};
pub use temporal_difference::{EpisodeReport, Selection, TdLearner, TdStep};
pub use value_iteration::ValueIteration;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{Result, config::TrainingConfig, racetrack::Track};

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Summary of one completed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// Index of the history sample this epoch produced.
    pub epoch: usize,
    /// Episodes run during the epoch (zero for Value Iteration).
    pub episodes: usize,
    pub aggregate_value: f64,
    /// Change against the previous epoch's aggregate.
    pub delta: f64,
}

/// An algorithm ready to run epochs against a track.
#[derive(Debug)]
pub enum Learner {
    ValueIteration(ValueIteration),
    TemporalDifference(TdLearner),
}

impl Learner {
    pub fn from_config(config: &TrainingConfig) -> Self {
        match config.algorithm {
            Algorithm::ValueIteration => Learner::ValueIteration(ValueIteration::new(
                config.discount,
                config.success_probability,
            )),
            Algorithm::QLearning | Algorithm::Sarsa => {
                Learner::TemporalDifference(TdLearner::from_config(config))
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Learner::ValueIteration(_) => Algorithm::ValueIteration,
            Learner::TemporalDifference(td) => td.algorithm(),
        }
    }

    /// Run one epoch and record its value aggregate.
    ///
    /// `on_episode` is called after every TD episode; an error from it
    /// aborts the epoch.
    pub fn run_epoch<F>(&mut self, track: &mut Track, mut on_episode: F) -> Result<EpochReport>
    where
        F: FnMut(&EpisodeReport) -> Result<()>,
    {
        let mut episodes = 0;
        let sample = match self {
            Learner::ValueIteration(vi) => vi.sweep(track),
            Learner::TemporalDifference(td) => {
                for _ in 0..td.episodes_per_epoch() {
                    let report = td.run_episode(track)?;
                    episodes += 1;
                    on_episode(&report)?;
                }
                track.update_state_values()
            }
        };
        let report = EpochReport {
            epoch: sample.epoch,
            episodes,
            aggregate_value: sample.aggregate_value,
            delta: track.check_convergence(),
        };
        log::debug!(
            "{} epoch {}: aggregate {:.6}, delta {:.6}",
            self.algorithm(),
            report.epoch,
            report.aggregate_value,
            report.delta
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::racetrack::{CrashPolicy, Grid, Track};

    fn track() -> Track {
        let grid = Grid::from_rows(&["S..", "...", "..F"]).unwrap();
        Track::build("square", grid, CrashPolicy::StopBeforeWall).unwrap()
    }

    #[test]
    fn test_epoch_appends_one_history_sample() {
        let mut track = track();
        for algorithm in Algorithm::ALL {
            track.reset_values();
            let config = TrainingConfig::new(algorithm).with_seed(5);
            let mut learner = Learner::from_config(&config);
            assert_eq!(learner.algorithm(), algorithm);

            let mut seen = 0;
            let report = learner
                .run_epoch(&mut track, |_| {
                    seen += 1;
                    Ok(())
                })
                .unwrap();
            assert_eq!(report.epoch, 0);
            assert_eq!(report.episodes, seen);
            assert_eq!(track.history().len(), 1);
            assert!(report.delta.is_infinite());
        }
    }

    #[test]
    fn test_seeded_rngs_agree() {
        use rand::Rng;
        let a: u64 = build_rng(Some(42)).random();
        let b: u64 = build_rng(Some(42)).random();
        assert_eq!(a, b);
    }
}
