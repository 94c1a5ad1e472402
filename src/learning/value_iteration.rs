//! Synchronous Value Iteration.
//!
//! Each sweep backs up every edge from the state values of the previous
//! sweep:
//!
//! ```text
//! q(s, a) = -1 + γ (p · V(success) + (1 - p) · V(fail))
//! ```
//!
//! and then refreshes the state values. With fixed parameters the result is
//! fully deterministic.

use crate::racetrack::{HistorySample, Track};

/// Cost of a single move.
pub const STEP_COST: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueIteration {
    discount: f64,
    success_probability: f64,
}

impl ValueIteration {
    pub fn new(discount: f64, success_probability: f64) -> Self {
        Self {
            discount,
            success_probability,
        }
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Recompute every q-value from the current state values.
    pub fn backup(&self, track: &mut Track) {
        let p = self.success_probability;
        let (states, actions) = track.tables_mut();
        for edge in actions.iter_mut() {
            let expected =
                p * states[edge.success.state].value + (1.0 - p) * states[edge.fail.state].value;
            edge.q_value = STEP_COST + self.discount * expected;
        }
    }

    /// One full epoch: backup followed by a state-value update.
    pub fn sweep(&self, track: &mut Track) -> HistorySample {
        self.backup(track);
        track.update_state_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::racetrack::{Acceleration, CrashPolicy, Grid, Position, Velocity};

    #[test]
    fn test_first_sweep_costs_one_step_everywhere() {
        let grid = Grid::from_rows(&["S..F"]).unwrap();
        let mut track = Track::build("line", grid, CrashPolicy::StopBeforeWall).unwrap();
        let vi = ValueIteration::new(0.9, 0.8);
        vi.sweep(&mut track);
        assert!(track.actions().iter().all(|edge| edge.q_value == STEP_COST));
    }

    #[test]
    fn test_backup_mixes_success_and_fail_values() {
        let grid = Grid::from_rows(&["S...F"]).unwrap();
        let mut track = Track::build("line", grid, CrashPolicy::StopBeforeWall).unwrap();
        let vi = ValueIteration::new(0.5, 0.8);
        vi.sweep(&mut track);
        vi.sweep(&mut track);

        // from rest at the start, accelerating lands on (1, 0) with velocity 1
        // (value -1), failing stays put at rest (value -1)
        let start = track
            .states()
            .lookup(Position::new(0, 0), Velocity::ZERO)
            .unwrap();
        let edge = track
            .actions()
            .edge_for(start, Acceleration::new(1, 0))
            .unwrap();
        assert!((track.edge(edge).q_value - (-1.5)).abs() < 1e-12);
    }
}
