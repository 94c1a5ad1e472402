//! State space: every (position, velocity) pair on the track.
//!
//! Positions are the non-wall cells in row-major order; velocities range over
//! `[MIN_VELOCITY, MAX_VELOCITY]` per axis with `x` varying slowest. A state's
//! id is its enumeration index, so the same grid always yields the same ids.

use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};

use super::grid::{CellType, Grid, Position};
use crate::{Error, Result, identifiers::StateId};

pub const MIN_VELOCITY: i32 = -5;
pub const MAX_VELOCITY: i32 = 5;

/// Distinct values per velocity axis.
pub const VELOCITY_SPAN: usize = (MAX_VELOCITY - MIN_VELOCITY + 1) as usize;

/// Velocity combinations attached to every track position.
pub const VELOCITIES_PER_POSITION: usize = VELOCITY_SPAN * VELOCITY_SPAN;

/// Vehicle velocity in cells per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Velocity {
    pub x: i32,
    pub y: i32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Velocity after adding `(dx, dy)`, clamped to the legal range per axis.
    pub fn accelerated(self, dx: i32, dy: i32) -> Self {
        Self::new(
            (self.x + dx).clamp(MIN_VELOCITY, MAX_VELOCITY),
            (self.y + dy).clamp(MIN_VELOCITY, MAX_VELOCITY),
        )
    }

    pub fn is_in_range(self) -> bool {
        (MIN_VELOCITY..=MAX_VELOCITY).contains(&self.x)
            && (MIN_VELOCITY..=MAX_VELOCITY).contains(&self.y)
    }

    /// Offset of this velocity inside a position's block of states.
    fn ordinal(self) -> usize {
        (self.x - MIN_VELOCITY) as usize * VELOCITY_SPAN + (self.y - MIN_VELOCITY) as usize
    }

    /// All legal velocities, `x` outer and `y` inner.
    pub fn all() -> impl Iterator<Item = Velocity> {
        (MIN_VELOCITY..=MAX_VELOCITY)
            .flat_map(|x| (MIN_VELOCITY..=MAX_VELOCITY).map(move |y| Velocity::new(x, y)))
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.x, self.y)
    }
}

/// A (position, velocity) pair plus its current value estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub position: Position,
    pub velocity: Velocity,
    /// Cell type under `position` (never `Wall`).
    pub cell: CellType,
    /// Best estimate of the expected discounted cost from this state.
    pub value: f64,
}

impl State {
    /// Finish states are absorbing and own no action edges.
    pub fn is_terminal(&self) -> bool {
        self.cell == CellType::Finish
    }
}

/// Arena of all states, indexed by [`StateId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpace {
    states: Vec<State>,
    /// Grid cell index -> ordinal among track positions.
    position_slots: Vec<Option<u32>>,
    width: usize,
    height: usize,
}

impl StateSpace {
    /// Enumerate every (track position, velocity) pair of `grid`.
    pub fn build(grid: &Grid) -> Self {
        let mut position_slots = vec![None; grid.len()];
        let mut states = Vec::new();
        let mut slot = 0u32;

        for (index, (position, cell)) in grid.cells().enumerate() {
            if !cell.is_track() {
                continue;
            }
            position_slots[index] = Some(slot);
            slot += 1;
            for velocity in Velocity::all() {
                states.push(State {
                    id: StateId::new(states.len()),
                    position,
                    velocity,
                    cell,
                    value: 0.0,
                });
            }
        }

        Self {
            states,
            position_slots,
            width: grid.width(),
            height: grid.height(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of distinct track positions.
    pub fn position_count(&self) -> usize {
        self.states.len() / VELOCITIES_PER_POSITION
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// State by id, failing with [`Error::UnknownState`] for foreign ids.
    pub fn state(&self, id: StateId) -> Result<&State> {
        self.get(id).ok_or(Error::UnknownState {
            state: id.index(),
            len: self.states.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut State> {
        self.states.iter_mut()
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.get_mut(id.index())
    }

    /// Exact lookup of the state at `position` moving with `velocity`.
    pub fn lookup(&self, position: Position, velocity: Velocity) -> Option<StateId> {
        if !velocity.is_in_range() || position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        let slot = self.position_slots[y * self.width + x]? as usize;
        Some(StateId::new(
            slot * VELOCITIES_PER_POSITION + velocity.ordinal(),
        ))
    }

    /// Like [`lookup`](Self::lookup) but a miss is an [`Error::UnmappedState`].
    pub fn require(&self, position: Position, velocity: Velocity) -> Result<StateId> {
        self.lookup(position, velocity).ok_or(Error::UnmappedState {
            x: position.x,
            y: position.y,
            x_vel: velocity.x,
            y_vel: velocity.y,
        })
    }

    /// Check the tables against `grid` so that lookups and indexing by id
    /// cannot go out of range.
    pub(crate) fn check_consistency(&self, grid: &Grid) -> Result<()> {
        if self.width != grid.width()
            || self.height != grid.height()
            || self.position_slots.len() != grid.len()
        {
            return Err(Error::InconsistentTables {
                message: format!(
                    "state space covers {} cells of a {}x{} layout, grid is {}x{}",
                    self.position_slots.len(),
                    self.width,
                    self.height,
                    grid.width(),
                    grid.height()
                ),
            });
        }

        let positions = self.position_slots.iter().flatten().count();
        if positions * VELOCITIES_PER_POSITION != self.states.len() {
            return Err(Error::InconsistentTables {
                message: format!(
                    "{} states for {positions} track positions",
                    self.states.len()
                ),
            });
        }
        for &slot in self.position_slots.iter().flatten() {
            if slot as usize >= positions {
                return Err(Error::UnknownState {
                    state: slot as usize * VELOCITIES_PER_POSITION,
                    len: self.states.len(),
                });
            }
        }
        for (index, state) in self.states.iter().enumerate() {
            if state.id.index() != index {
                return Err(Error::UnknownState {
                    state: state.id.index(),
                    len: self.states.len(),
                });
            }
        }
        Ok(())
    }

    /// States sitting on a start cell with zero velocity.
    pub fn resting_starts(&self) -> impl Iterator<Item = &State> {
        self.states
            .iter()
            .filter(|state| state.cell == CellType::Start && state.velocity == Velocity::ZERO)
    }
}

impl Index<StateId> for StateSpace {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::from_rows(&["#S#", "#.#", "#F#"]).unwrap()
    }

    #[test]
    fn test_state_count_excludes_walls() {
        let space = StateSpace::build(&grid());
        assert_eq!(space.position_count(), 3);
        assert_eq!(space.len(), 3 * VELOCITIES_PER_POSITION);
    }

    #[test]
    fn test_ids_follow_enumeration_order() {
        let space = StateSpace::build(&grid());
        for (index, state) in space.iter().enumerate() {
            assert_eq!(state.id.index(), index);
            assert_eq!(space.lookup(state.position, state.velocity), Some(state.id));
        }
        let first = &space[StateId::new(0)];
        assert_eq!(first.position, Position::new(1, 0));
        assert_eq!(first.velocity, Velocity::new(MIN_VELOCITY, MIN_VELOCITY));
        assert_eq!(first.cell, CellType::Start);
    }

    #[test]
    fn test_lookup_misses() {
        let space = StateSpace::build(&grid());
        assert_eq!(space.lookup(Position::new(0, 0), Velocity::ZERO), None);
        assert_eq!(space.lookup(Position::new(1, 1), Velocity::new(6, 0)), None);
        assert_eq!(space.lookup(Position::new(-1, 1), Velocity::ZERO), None);
        assert!(matches!(
            space.require(Position::new(0, 0), Velocity::new(1, 2)),
            Err(Error::UnmappedState {
                x: 0,
                y: 0,
                x_vel: 1,
                y_vel: 2
            })
        ));
    }

    #[test]
    fn test_velocity_clamping() {
        assert_eq!(Velocity::new(5, -5).accelerated(1, -1), Velocity::new(5, -5));
        assert_eq!(Velocity::new(4, 0).accelerated(1, -1), Velocity::new(5, -1));
    }

    #[test]
    fn test_resting_starts() {
        let space = StateSpace::build(&grid());
        let starts: Vec<_> = space.resting_starts().collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].position, Position::new(1, 0));
        assert_eq!(starts[0].velocity, Velocity::ZERO);
    }

    #[test]
    fn test_finish_states_are_terminal() {
        let space = StateSpace::build(&grid());
        let id = space.lookup(Position::new(1, 2), Velocity::ZERO).unwrap();
        assert!(space[id].is_terminal());
    }
}
