//! Q-Learning and SARSA over precomputed action edges.
//!
//! Both learners walk episodes edge by edge. Each visit decays the edge's
//! learning rate as `tau / (tau + visits)` and applies one TD update:
//!
//! - success lands on Finish: `q ← q + lr · (-1 - q)` and the episode ends
//! - otherwise: `q ← q + lr · (-1 + γ · q_target - q)`
//!
//! where `q_target` is the greedy successor edge for Q-Learning and the
//! ε-greedy chosen successor edge for SARSA. The walk then continues from
//! the chosen edge.

use rand::{Rng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::{
    algorithm::{Algorithm, StartSelection},
    build_rng,
    value_iteration::STEP_COST,
};
use crate::{
    Error, Result,
    config::TrainingConfig,
    identifiers::{EdgeId, StateId},
    racetrack::{CellType, MAX_VELOCITY, MIN_VELOCITY, Track, Velocity},
};

/// Result of ε-greedy selection at one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Edge to follow next.
    pub chosen: EdgeId,
    /// Highest-valued edge at the state.
    pub greedy: EdgeId,
    /// Whether the exploratory branch was taken (the random pick may still
    /// coincide with the greedy edge).
    pub explored: bool,
}

/// Outcome of a single TD update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdStep {
    /// The edge that was updated.
    pub edge: EdgeId,
    /// Next edge to follow, `None` once the episode is over.
    pub next: Option<Selection>,
    /// Learning rate used for the update.
    pub learning_rate: f64,
    pub terminal: bool,
}

/// Summary of one training episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub start: EdgeId,
    pub steps: usize,
    pub reached_finish: bool,
}

/// Episodic TD learner (Q-Learning or SARSA).
#[derive(Debug, Clone)]
pub struct TdLearner {
    algorithm: Algorithm,
    discount: f64,
    tau: f64,
    epsilon: f64,
    episodes_per_epoch: usize,
    max_steps: usize,
    start_selection: StartSelection,
    rng: StdRng,
}

impl TdLearner {
    /// A learner with the default hyperparameters.
    pub fn new(algorithm: Algorithm) -> Self {
        Self::from_config(&TrainingConfig::new(algorithm))
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            discount: config.discount,
            tau: config.tau,
            epsilon: config.epsilon,
            episodes_per_epoch: config.episodes_per_epoch,
            max_steps: config.max_steps_per_episode,
            start_selection: config.start_selection,
            rng: build_rng(config.seed),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn episodes_per_epoch(&self) -> usize {
        self.episodes_per_epoch
    }

    /// ε-greedy choice among the edges leaving `state`.
    ///
    /// Returns `None` for finish states.
    pub fn select(&mut self, track: &Track, state: StateId) -> Option<Selection> {
        let greedy = track.best_action(state)?;
        if self.rng.random::<f64>() < self.epsilon {
            let chosen = track.actions().edges_of(state).choose(&mut self.rng)?.id;
            Some(Selection {
                chosen,
                greedy,
                explored: true,
            })
        } else {
            Some(Selection {
                chosen: greedy,
                greedy,
                explored: false,
            })
        }
    }

    /// First edge of a new episode.
    pub fn select_start(&mut self, track: &Track) -> Result<EdgeId> {
        let starts: Vec<_> = track.grid().positions_of(CellType::Start).collect();
        let position = *starts.choose(&mut self.rng).ok_or(Error::MissingTerminal {
            cell: CellType::Start,
        })?;

        let velocity = match self.start_selection {
            StartSelection::Random => Velocity::new(
                self.rng.random_range(MIN_VELOCITY..=MAX_VELOCITY),
                self.rng.random_range(MIN_VELOCITY..=MAX_VELOCITY),
            ),
            StartSelection::Best => Velocity::ZERO,
        };
        let state = track.states().require(position, velocity)?;

        let edge = match self.start_selection {
            StartSelection::Random => track
                .actions()
                .edges_of(state)
                .choose(&mut self.rng)
                .map(|e| e.id),
            StartSelection::Best => track.best_action(state),
        };
        edge.ok_or(Error::UnknownState {
            state: state.index(),
            len: track.states().len(),
        })
    }

    /// Apply one TD update to `edge` and pick the edge to follow next.
    pub fn step(&mut self, track: &mut Track, edge: EdgeId) -> TdStep {
        let (q, learning_rate, success) = {
            let edge = &mut track.actions_mut()[edge];
            edge.learning_rate = self.tau / (self.tau + f64::from(edge.times_visited));
            edge.times_visited += 1;
            (edge.q_value, edge.learning_rate, edge.success)
        };

        let selection = if success.reaches_finish() {
            None
        } else {
            self.select(track, success.state)
        };

        let Some(selection) = selection else {
            track.actions_mut()[edge].q_value = q + learning_rate * (STEP_COST - q);
            return TdStep {
                edge,
                next: None,
                learning_rate,
                terminal: true,
            };
        };

        let target = match self.algorithm {
            Algorithm::Sarsa => track.edge(selection.chosen).q_value,
            _ => track.edge(selection.greedy).q_value,
        };
        track.actions_mut()[edge].q_value =
            q + learning_rate * (STEP_COST + self.discount * target - q);

        TdStep {
            edge,
            next: Some(selection),
            learning_rate,
            terminal: false,
        }
    }

    /// Run one episode from a freshly selected start edge.
    pub fn run_episode(&mut self, track: &mut Track) -> Result<EpisodeReport> {
        let start = self.select_start(track)?;
        let mut edge = start;
        for steps in 1..=self.max_steps {
            let step = self.step(track, edge);
            match step.next {
                Some(selection) => edge = selection.chosen,
                None => {
                    return Ok(EpisodeReport {
                        start,
                        steps,
                        reached_finish: true,
                    });
                }
            }
        }
        log::trace!("episode from {start} hit the {} step cap", self.max_steps);
        Ok(EpisodeReport {
            start,
            steps: self.max_steps,
            reached_finish: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::racetrack::{Acceleration, CrashPolicy, Grid, Position};

    fn corridor() -> Track {
        let grid = Grid::from_rows(&["S...F"]).unwrap();
        Track::build("corridor", grid, CrashPolicy::StopBeforeWall).unwrap()
    }

    fn edge_at(track: &Track, x: i32, vx: i32, accel: Acceleration) -> EdgeId {
        let state = track
            .states()
            .lookup(Position::new(x, 0), Velocity::new(vx, 0))
            .unwrap();
        track.actions().edge_for(state, accel).unwrap()
    }

    #[test]
    fn test_learning_rate_decays_with_visits() {
        let mut track = corridor();
        let mut learner = TdLearner::new(Algorithm::QLearning).with_seed(1);
        let edge = edge_at(&track, 0, 0, Acceleration::new(1, 0));

        let first = learner.step(&mut track, edge);
        assert_eq!(first.learning_rate, 1.0);
        let second = learner.step(&mut track, edge);
        assert!((second.learning_rate - 100.0 / 101.0).abs() < 1e-12);
        assert_eq!(track.edge(edge).times_visited, 2);
    }

    #[test]
    fn test_finish_uses_terminal_update() {
        let mut track = corridor();
        let mut learner = TdLearner::new(Algorithm::Sarsa).with_seed(1);
        // from (3, 0) at rest, accelerating right crosses the finish
        let edge = edge_at(&track, 3, 0, Acceleration::new(1, 0));
        track.actions_mut()[edge].q_value = -4.0;

        let step = learner.step(&mut track, edge);
        assert!(step.terminal);
        assert!(step.next.is_none());
        // lr = 1: q = -4 + 1 * (-1 - -4)
        assert_eq!(track.edge(edge).q_value, -1.0);
    }

    #[test]
    fn test_non_terminal_bootstraps_from_successor() {
        let mut track = corridor();
        let mut learner = TdLearner::new(Algorithm::QLearning).with_seed(3);
        learner.epsilon = 0.0;
        for edge in track.actions_mut().iter_mut() {
            edge.q_value = -2.0;
        }
        let edge = edge_at(&track, 0, 0, Acceleration::new(1, 0));
        let step = learner.step(&mut track, edge);
        assert!(!step.terminal);
        // lr = 1: q = -1 + 0.9 * -2
        assert!((track.edge(edge).q_value - (-2.8)).abs() < 1e-12);
    }

    #[test]
    fn test_sarsa_bootstraps_from_chosen_edge() {
        for algorithm in [Algorithm::QLearning, Algorithm::Sarsa] {
            let mut track = corridor();
            let mut learner = TdLearner::new(algorithm).with_seed(5);
            learner.epsilon = 1.0;
            for edge in track.actions_mut().iter_mut() {
                edge.q_value = -2.0;
            }
            // the successor of (0, 0) at rest accelerating right is (1, 0) moving right
            let greedy = edge_at(&track, 1, 1, Acceleration::new(0, 0));
            track.actions_mut()[greedy].q_value = 0.0;

            let edge = edge_at(&track, 0, 0, Acceleration::new(1, 0));
            let step = learner.step(&mut track, edge);
            let selection = step.next.unwrap();
            assert!(selection.explored);
            assert_eq!(selection.greedy, greedy);

            let expected = match algorithm {
                Algorithm::Sarsa => -1.0 + 0.9 * track.edge(selection.chosen).q_value,
                _ => -1.0,
            };
            assert!((track.edge(edge).q_value - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_start_selection_best_uses_resting_start() {
        let mut track = corridor();
        let mut learner = TdLearner::from_config(
            &TrainingConfig::new(Algorithm::QLearning)
                .with_start_selection(StartSelection::Best)
                .with_seed(2),
        );
        let edge = learner.select_start(&track).unwrap();
        let state = &track.states()[track.edge(edge).state];
        assert_eq!(state.position, Position::new(0, 0));
        assert_eq!(state.velocity, Velocity::ZERO);

        let best = edge_at(&track, 0, 0, Acceleration::new(1, 1));
        for e in track.actions_mut().iter_mut() {
            e.q_value = -1.0;
        }
        track.actions_mut()[best].q_value = 0.0;
        assert_eq!(learner.select_start(&track).unwrap(), best);
    }

    #[test]
    fn test_random_start_stays_on_start_cells() {
        let track = corridor();
        let mut learner = TdLearner::new(Algorithm::Sarsa).with_seed(8);
        for _ in 0..200 {
            let edge = learner.select_start(&track).unwrap();
            let state = &track.states()[track.edge(edge).state];
            assert_eq!(state.cell, CellType::Start);
        }
    }

    #[test]
    fn test_episode_reaches_finish_on_short_track() {
        let mut track = corridor();
        let mut learner = TdLearner::new(Algorithm::QLearning).with_seed(4);
        let report = learner.run_episode(&mut track).unwrap();
        assert!(report.steps >= 1);

        let visits: u32 = track.actions().iter().map(|e| e.times_visited).sum();
        assert_eq!(visits as usize, report.steps);
        let start = &track.states()[track.edge(report.start).state];
        assert_eq!(start.cell, CellType::Start);
    }
}
