//! Racetrack model: grid, rasterized motion and the MDP tables built on top.
//!
//! A [`Track`] is assembled in three steps:
//!
//! 1. [`Grid`] parses the track file.
//! 2. [`StateSpace`] enumerates every (position, velocity) pair.
//! 3. [`ActionSpace`] precomputes, for every state and acceleration, where the
//!    vehicle lands when the acceleration succeeds and when it fails. Moves
//!    are traced cell by cell with [`rasterize`] and resolved against walls
//!    and the finish line by [`CollisionResolver`].
//!
//! ```
//! use racetrack::racetrack::{CrashPolicy, Grid, Track};
//!
//! let grid = Grid::from_rows(&["S..F"])?;
//! let track = Track::build("corridor", grid, CrashPolicy::StopBeforeWall)?;
//! assert_eq!(track.states().position_count(), 4);
//! # Ok::<(), racetrack::Error>(())
//! ```

pub mod action_space;
pub mod collision;
pub mod grid;
pub mod raster;
pub mod serialization;
pub mod state_space;
pub mod track;

pub use action_space::{Acceleration, ActionEdge, ActionSpace, Transition};
pub use collision::{CollisionResolver, CrashPolicy, Landing};
pub use grid::{CellType, Grid, Position};
pub use raster::{path_length, rasterize};
pub use serialization::SavedTrack;
pub use state_space::{MAX_VELOCITY, MIN_VELOCITY, State, StateSpace, Velocity};
pub use track::{CONVERGENCE_SENTINEL, ConvergenceHistory, HistorySample, Track};
