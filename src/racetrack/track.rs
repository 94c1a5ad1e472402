//! Track: grid, state space, action space and convergence history.
//!
//! The track owns every table. Learning algorithms borrow it mutably and
//! update edge q-values, learning metadata and state values in place.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    action_space::{ActionEdge, ActionSpace},
    collision::CrashPolicy,
    grid::{CellType, Grid},
    state_space::StateSpace,
};
use crate::{
    Result,
    identifiers::{EdgeId, StateId},
};

/// Returned by [`Track::check_convergence`] while fewer than two samples exist.
pub const CONVERGENCE_SENTINEL: f64 = f64::INFINITY;

/// One convergence sample: aggregate `sum(|value|)` after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub epoch: usize,
    pub aggregate_value: f64,
}

/// Append-only sequence of convergence samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceHistory {
    samples: Vec<HistorySample>,
}

impl ConvergenceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `aggregate_value` under the next epoch index.
    pub fn record(&mut self, aggregate_value: f64) -> HistorySample {
        let sample = HistorySample {
            epoch: self.samples.len(),
            aggregate_value,
        };
        self.samples.push(sample);
        sample
    }

    /// Absolute change between the last two samples.
    pub fn last_delta(&self) -> f64 {
        match self.samples.as_slice() {
            [.., previous, last] => (last.aggregate_value - previous.aggregate_value).abs(),
            _ => CONVERGENCE_SENTINEL,
        }
    }

    pub fn samples(&self) -> &[HistorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A racetrack with its precomputed MDP tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    name: String,
    crash_policy: CrashPolicy,
    grid: Grid,
    states: StateSpace,
    actions: ActionSpace,
    history: ConvergenceHistory,
}

impl Track {
    /// Build the state and action spaces for `grid`.
    ///
    /// This is the expensive step; the result is meant to be persisted and
    /// reloaded rather than rebuilt.
    pub fn build(name: impl Into<String>, grid: Grid, crash_policy: CrashPolicy) -> Result<Self> {
        let name = name.into();
        log::info!(
            "building state table for track '{name}' ({}x{})",
            grid.width(),
            grid.height()
        );
        let states = StateSpace::build(&grid);

        log::info!(
            "building action table for track '{name}' ({} states, crash policy: {crash_policy})",
            states.len()
        );
        let actions = ActionSpace::build(&grid, &states, crash_policy)?;
        log::info!("track '{name}' ready with {} action edges", actions.len());

        Ok(Self {
            name,
            crash_policy,
            grid,
            states,
            actions,
            history: ConvergenceHistory::new(),
        })
    }

    /// Load a track file and build its tables. The file stem names the track.
    pub fn from_file<P: AsRef<Path>>(path: P, crash_policy: CrashPolicy) -> Result<Self> {
        let path = path.as_ref();
        let grid = Grid::load(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().trim_end_matches("-track").to_string())
            .unwrap_or_else(|| "track".to_string());
        Self::build(name, grid, crash_policy)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crash_policy(&self) -> CrashPolicy {
        self.crash_policy
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn states(&self) -> &StateSpace {
        &self.states
    }

    pub fn actions(&self) -> &ActionSpace {
        &self.actions
    }

    pub(crate) fn actions_mut(&mut self) -> &mut ActionSpace {
        &mut self.actions
    }

    /// State values for reading alongside mutable edges.
    pub(crate) fn tables_mut(&mut self) -> (&StateSpace, &mut ActionSpace) {
        (&self.states, &mut self.actions)
    }

    pub fn history(&self) -> &ConvergenceHistory {
        &self.history
    }

    /// Cross-check grid, state and action tables, as needed for decoded data.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        self.grid.check_consistency()?;
        self.states.check_consistency(&self.grid)?;
        self.actions.check_consistency(&self.states)
    }

    /// Fail with [`crate::Error::MissingTerminal`] unless the grid has both a
    /// start and a finish cell.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate_terminals()
    }

    /// Current value of `state`.
    pub fn value(&self, state: StateId) -> f64 {
        self.states[state].value
    }

    pub fn edge(&self, edge: EdgeId) -> &ActionEdge {
        &self.actions[edge]
    }

    /// Edge with the highest q-value leaving `state`, or `None` for finish
    /// states. Ties go to any maximizer.
    pub fn best_action(&self, state: StateId) -> Option<EdgeId> {
        self.actions
            .edges_of(state)
            .iter()
            .max_by(|a, b| a.q_value.total_cmp(&b.q_value))
            .map(|edge| edge.id)
    }

    /// Set every state value to its best outgoing q-value and record the
    /// aggregate `sum(|value|)` in the history.
    ///
    /// States without edges keep their previous value.
    pub fn update_state_values(&mut self) -> HistorySample {
        let mut aggregate = 0.0;
        for state in self.states.iter_mut() {
            let best = self
                .actions
                .edges_of(state.id)
                .iter()
                .map(|edge| edge.q_value)
                .reduce(f64::max);
            if let Some(best) = best {
                state.value = best;
            }
            aggregate += state.value.abs();
        }
        self.history.record(aggregate)
    }

    /// Absolute difference between the last two recorded aggregates, or
    /// [`CONVERGENCE_SENTINEL`] with fewer than two samples.
    pub fn check_convergence(&self) -> f64 {
        self.history.last_delta()
    }

    /// Zero every value, q-value and learning statistic and clear the history.
    pub fn reset_values(&mut self) {
        for state in self.states.iter_mut() {
            state.value = 0.0;
        }
        for edge in self.actions.iter_mut() {
            edge.q_value = 0.0;
            edge.times_visited = 0;
            edge.learning_rate = 0.0;
        }
        self.history = ConvergenceHistory::new();
    }

    /// Seed every q-value with a small negative random value in `[-scale, 0)`.
    pub fn seed_q_values<R: Rng + ?Sized>(&mut self, rng: &mut R, scale: f64) {
        if scale <= 0.0 {
            return;
        }
        for edge in self.actions.iter_mut() {
            edge.q_value = rng.random_range(-scale..0.0);
        }
    }

    /// Copy learned tables from a previously trained track that shares
    /// coordinates, typically a smaller version of the same course.
    ///
    /// Edges match on (position, velocity, acceleration) and states on
    /// (position, velocity); unmatched entries keep their current values.
    /// The previous convergence history is carried over. Returns the number
    /// of edges copied.
    pub fn warm_start_from(&mut self, previous: &Track) -> usize {
        let mut copied = 0;
        for state_index in 0..self.states.len() {
            let id = StateId::new(state_index);
            let (position, velocity) = {
                let state = &self.states[id];
                (state.position, state.velocity)
            };
            let Some(previous_id) = previous.states.lookup(position, velocity) else {
                continue;
            };
            if let Some(state) = self.states.get_mut(id) {
                state.value = previous.states[previous_id].value;
            }

            let own: Vec<EdgeId> = self.actions.edges_of(id).iter().map(|e| e.id).collect();
            for edge_id in own {
                let acceleration = self.actions[edge_id].acceleration;
                let Some(source) = previous.actions.edge_for(previous_id, acceleration) else {
                    continue;
                };
                let source = &previous.actions[source];
                let edge = &mut self.actions[edge_id];
                edge.q_value = source.q_value;
                edge.times_visited = source.times_visited;
                edge.learning_rate = source.learning_rate;
                copied += 1;
            }
        }
        self.history = previous.history.clone();
        log::info!(
            "warm started track '{}' from '{}': {copied} edges copied",
            self.name,
            previous.name
        );
        copied
    }

    /// Number of start cells on the grid.
    pub fn start_count(&self) -> usize {
        self.grid.positions_of(CellType::Start).count()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::racetrack::{Acceleration, Position, Velocity};

    fn corridor() -> Track {
        let grid = Grid::from_rows(&["S..F"]).unwrap();
        Track::build("corridor", grid, CrashPolicy::StopBeforeWall).unwrap()
    }

    fn resting_start(track: &Track) -> StateId {
        track
            .states()
            .lookup(Position::new(0, 0), Velocity::ZERO)
            .unwrap()
    }

    #[test]
    fn test_best_action_picks_maximum() {
        let mut track = corridor();
        let state = resting_start(&track);
        let target = track
            .actions()
            .edge_for(state, Acceleration::new(1, 0))
            .unwrap();
        for edge in track.actions_mut().iter_mut() {
            edge.q_value = -5.0;
        }
        track.actions_mut()[target].q_value = -1.0;
        assert_eq!(track.best_action(state), Some(target));
    }

    #[test]
    fn test_best_action_none_for_finish() {
        let track = corridor();
        let finish = track
            .states()
            .lookup(Position::new(3, 0), Velocity::ZERO)
            .unwrap();
        assert_eq!(track.best_action(finish), None);
    }

    #[test]
    fn test_update_state_values_and_history() {
        let mut track = corridor();
        for edge in track.actions_mut().iter_mut() {
            edge.q_value = -2.0;
        }
        let sample = track.update_state_values();
        assert_eq!(sample.epoch, 0);

        let non_terminal = track.states().iter().filter(|s| !s.is_terminal()).count();
        assert_eq!(sample.aggregate_value, 2.0 * non_terminal as f64);

        // finish states keep their value
        for state in track.states().iter().filter(|s| s.is_terminal()) {
            assert_eq!(state.value, 0.0);
        }
        assert_eq!(track.check_convergence(), CONVERGENCE_SENTINEL);

        track.update_state_values();
        assert_eq!(track.history().len(), 2);
        assert_eq!(track.check_convergence(), 0.0);
    }

    #[test]
    fn test_reset_values_clears_learning() {
        let mut track = corridor();
        let mut rng = StdRng::seed_from_u64(1);
        track.seed_q_values(&mut rng, 0.01);
        track.update_state_values();
        track.reset_values();
        assert!(track.history().is_empty());
        assert!(track.actions().iter().all(|e| e.q_value == 0.0));
        assert!(track.states().iter().all(|s| s.value == 0.0));
    }

    #[test]
    fn test_seed_q_values_are_small_and_negative() {
        let mut track = corridor();
        let mut rng = StdRng::seed_from_u64(7);
        track.seed_q_values(&mut rng, 0.01);
        assert!(
            track
                .actions()
                .iter()
                .all(|e| e.q_value < 0.0 && e.q_value >= -0.01)
        );
    }

    #[test]
    fn test_warm_start_copies_matching_entries() {
        let mut small = corridor();
        for edge in small.actions_mut().iter_mut() {
            edge.q_value = -3.0;
            edge.times_visited = 4;
        }
        small.update_state_values();

        let grid = Grid::from_rows(&["S..F", "...."]).unwrap();
        let mut large = Track::build("large", grid, CrashPolicy::StopBeforeWall).unwrap();
        let copied = large.warm_start_from(&small);

        assert_eq!(copied, small.actions().len());
        assert_eq!(large.history(), small.history());

        let state = resting_start(&large);
        assert!(large.actions().edges_of(state).iter().all(|e| e.q_value == -3.0));
        assert_eq!(large.value(state), -3.0);

        let below = large
            .states()
            .lookup(Position::new(0, 1), Velocity::ZERO)
            .unwrap();
        assert!(large.actions().edges_of(below).iter().all(|e| e.q_value == 0.0));
    }

    #[test]
    fn test_from_file_names_track_by_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("L-track.txt");
        std::fs::write(&path, "1,3\nS.F\n").unwrap();
        let track = Track::from_file(&path, CrashPolicy::ReturnToStart).unwrap();
        assert_eq!(track.name(), "L");
        assert_eq!(track.crash_policy(), CrashPolicy::ReturnToStart);
        assert_eq!(track.start_count(), 1);
    }
}
