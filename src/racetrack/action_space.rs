//! Action space: every (state, acceleration) edge with precomputed outcomes.
//!
//! Each edge stores the successor for a successful acceleration and for a
//! failed one (acceleration not applied), both resolved through the
//! rasterizer against the grid. Edges of one state are contiguous and follow
//! [`Acceleration::ALL`] order, so an edge can be found from its state and
//! acceleration without a search.

use std::ops::{Index, IndexMut, Range};

use serde::{Deserialize, Serialize};

use super::{
    collision::{CollisionResolver, CrashPolicy, Landing},
    grid::{CellType, Grid, Position},
    state_space::{State, StateSpace, Velocity},
};
use crate::{
    Error, Result,
    identifiers::{EdgeId, StateId},
};

/// Acceleration applied for one step, each axis in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: i32,
    pub y: i32,
}

impl Acceleration {
    /// All nine accelerations, `x` outer and `y` inner.
    pub const ALL: [Acceleration; 9] = [
        Acceleration::new(-1, -1),
        Acceleration::new(-1, 0),
        Acceleration::new(-1, 1),
        Acceleration::new(0, -1),
        Acceleration::new(0, 0),
        Acceleration::new(0, 1),
        Acceleration::new(1, -1),
        Acceleration::new(1, 0),
        Acceleration::new(1, 1),
    ];

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position of this acceleration in [`Acceleration::ALL`].
    pub fn ordinal(self) -> Option<usize> {
        if !(-1..=1).contains(&self.x) || !(-1..=1).contains(&self.y) {
            return None;
        }
        Some(((self.x + 1) * 3 + (self.y + 1)) as usize)
    }
}

/// Resolved outcome of one branch of an action edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Successor state.
    pub state: StateId,
    /// How the move ended: `Finish`, `Wall` (crash) or the landing cell type.
    pub landing: CellType,
}

impl Transition {
    pub fn reaches_finish(&self) -> bool {
        self.landing == CellType::Finish
    }

    pub fn crashed(&self) -> bool {
        self.landing == CellType::Wall
    }
}

/// A (state, acceleration) pair with its successors and learning metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEdge {
    pub id: EdgeId,
    pub state: StateId,
    pub acceleration: Acceleration,
    /// Outcome when the acceleration is applied.
    pub success: Transition,
    /// Outcome when the acceleration is not applied.
    pub fail: Transition,
    pub q_value: f64,
    pub times_visited: u32,
    pub learning_rate: f64,
}

/// Arena of all action edges, indexed by [`EdgeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    edges: Vec<ActionEdge>,
    /// State index -> range of its edges (empty for finish states).
    by_state: Vec<Range<usize>>,
}

impl ActionSpace {
    /// Precompute every edge of every non-finish state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnmappedState`] if a resolved successor has no
    /// state, which indicates a defect in the state space.
    pub fn build(grid: &Grid, states: &StateSpace, policy: CrashPolicy) -> Result<Self> {
        let resolver = CollisionResolver::new(grid, policy);
        let mut edges = Vec::with_capacity(
            states.iter().filter(|s| !s.is_terminal()).count() * Acceleration::ALL.len(),
        );
        let mut by_state = Vec::with_capacity(states.len());

        for state in states.iter() {
            let first = edges.len();
            if !state.is_terminal() {
                let fail = resolve_transition(&resolver, states, state, state.velocity)?;
                for acceleration in Acceleration::ALL {
                    let adjusted = state.velocity.accelerated(acceleration.x, acceleration.y);
                    let success = resolve_transition(&resolver, states, state, adjusted)?;
                    edges.push(ActionEdge {
                        id: EdgeId::new(edges.len()),
                        state: state.id,
                        acceleration,
                        success,
                        fail,
                        q_value: 0.0,
                        times_visited: 0,
                        learning_rate: 0.0,
                    });
                }
            }
            by_state.push(first..edges.len());
        }

        Ok(Self { edges, by_state })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, id: EdgeId) -> Option<&ActionEdge> {
        self.edges.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionEdge> {
        self.edges.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActionEdge> {
        self.edges.iter_mut()
    }

    /// Outgoing edges of `state` (empty for finish states and foreign ids).
    pub fn edges_of(&self, state: StateId) -> &[ActionEdge] {
        match self.by_state.get(state.index()) {
            Some(range) => &self.edges[range.clone()],
            None => &[],
        }
    }

    /// Edge of `state` for `acceleration`, if the state has edges.
    pub fn edge_for(&self, state: StateId, acceleration: Acceleration) -> Option<EdgeId> {
        let range = self.by_state.get(state.index())?;
        let edge = range.start + acceleration.ordinal()?;
        range.contains(&edge).then(|| EdgeId::new(edge))
    }
}

impl ActionSpace {
    /// Check that every edge range and successor id stays inside the tables.
    pub(crate) fn check_consistency(&self, states: &StateSpace) -> Result<()> {
        if self.by_state.len() != states.len() {
            return Err(Error::InconsistentTables {
                message: format!(
                    "edge ranges cover {} states, state space has {}",
                    self.by_state.len(),
                    states.len()
                ),
            });
        }

        let unknown = |state: StateId| Error::UnknownState {
            state: state.index(),
            len: states.len(),
        };
        for (state_index, range) in self.by_state.iter().enumerate() {
            let width = range.end.saturating_sub(range.start);
            if range.end > self.edges.len() || !(width == 0 || width == Acceleration::ALL.len()) {
                return Err(Error::InconsistentTables {
                    message: format!(
                        "state {state_index} owns edges {range:?} of {}",
                        self.edges.len()
                    ),
                });
            }
            for edge in &self.edges[range.clone()] {
                if edge.state.index() != state_index {
                    return Err(unknown(edge.state));
                }
            }
        }

        for (index, edge) in self.edges.iter().enumerate() {
            if edge.id.index() != index {
                return Err(Error::InconsistentTables {
                    message: format!("edge at {index} carries id {}", edge.id),
                });
            }
            for state in [edge.state, edge.success.state, edge.fail.state] {
                if state.index() >= states.len() {
                    return Err(unknown(state));
                }
            }
        }
        Ok(())
    }
}

impl Index<EdgeId> for ActionSpace {
    type Output = ActionEdge;

    fn index(&self, id: EdgeId) -> &ActionEdge {
        &self.edges[id.index()]
    }
}

impl IndexMut<EdgeId> for ActionSpace {
    fn index_mut(&mut self, id: EdgeId) -> &mut ActionEdge {
        &mut self.edges[id.index()]
    }
}

/// Move `state` with `velocity`, resolve collisions and map the landing
/// back to a state. A crash zeroes the velocity.
fn resolve_transition(
    resolver: &CollisionResolver<'_>,
    states: &StateSpace,
    state: &State,
    velocity: Velocity,
) -> Result<Transition> {
    let destination: Position = state.position.offset(velocity.x, velocity.y);
    let Landing { position, cell } = resolver.resolve(state.position, destination);
    let next_velocity = if cell == CellType::Wall {
        Velocity::ZERO
    } else {
        velocity
    };
    Ok(Transition {
        state: states.require(position, next_velocity)?,
        landing: cell,
    })
}
