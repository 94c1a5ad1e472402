//! Stable integer identifiers for states and action edges.
//!
//! Both identifiers are arena indices: a `StateId` indexes the state space and
//! an `EdgeId` indexes the action space. They are assigned once, in
//! enumeration order, and never recomputed, so persisted tables that
//! reference them stay valid across reloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a (position, velocity) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(u32);

impl StateId {
    /// Create an identifier from an arena index.
    ///
    /// # Examples
    ///
    /// ```
    /// use racetrack::identifiers::StateId;
    ///
    /// let id = StateId::new(42);
    /// assert_eq!(id.index(), 42);
    /// ```
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the state in the state arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identifier of a (state, acceleration) action edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Create an identifier from an arena index.
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the edge in the action arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}
