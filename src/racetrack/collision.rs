//! Collision resolution for a single move along a rasterized path.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    grid::{CellType, Grid, Position},
    raster::{path_length, rasterize},
};
use crate::error::Error;

/// What happens to a vehicle whose move runs into a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashPolicy {
    /// Stop on the last track cell before the wall.
    #[default]
    StopBeforeWall,
    /// Return to the nearest start cell.
    ReturnToStart,
}

impl CrashPolicy {
    pub const VARIANTS: &'static [&'static str] = &["stop", "start"];
}

impl fmt::Display for CrashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashPolicy::StopBeforeWall => f.write_str("stop"),
            CrashPolicy::ReturnToStart => f.write_str("start"),
        }
    }
}

impl FromStr for CrashPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" | "stop-before-wall" | "stop_before_wall" => Ok(CrashPolicy::StopBeforeWall),
            "start" | "return-to-start" | "return_to_start" | "crash" => {
                Ok(CrashPolicy::ReturnToStart)
            }
            other => Err(Error::ParseCrashPolicy {
                input: other.to_string(),
                expected: Self::VARIANTS.join(", "),
            }),
        }
    }
}

/// Where a move actually ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landing {
    pub position: Position,
    /// `Finish` if the path crossed the finish line, `Wall` if it crashed,
    /// otherwise the type of the destination cell.
    pub cell: CellType,
}

/// Resolves moves against a grid under a fixed crash policy.
#[derive(Debug, Clone)]
pub struct CollisionResolver<'a> {
    grid: &'a Grid,
    policy: CrashPolicy,
    starts: Vec<Position>,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(grid: &'a Grid, policy: CrashPolicy) -> Self {
        Self {
            grid,
            policy,
            starts: grid.positions_of(CellType::Start).collect(),
        }
    }

    /// Walk the rasterized path from `from` to `to` and report the landing.
    ///
    /// Finish short-circuits the walk. The first wall (or off-grid cell)
    /// triggers the crash policy.
    pub fn resolve(&self, from: Position, to: Position) -> Landing {
        let path = rasterize(from, to);
        for (step, &pos) in path.iter().enumerate() {
            match self.grid.get(pos).unwrap_or(CellType::Wall) {
                CellType::Finish => {
                    return Landing {
                        position: pos,
                        cell: CellType::Finish,
                    };
                }
                CellType::Wall => {
                    let last_on_track = path[step.saturating_sub(1)];
                    return Landing {
                        position: self.crash_position(last_on_track),
                        cell: CellType::Wall,
                    };
                }
                CellType::Open | CellType::Start => {}
            }
        }

        // `path` always holds at least `from`
        let end = path[path.len() - 1];
        Landing {
            position: end,
            cell: self.grid.get(end).unwrap_or(CellType::Wall),
        }
    }

    fn crash_position(&self, last_on_track: Position) -> Position {
        match self.policy {
            CrashPolicy::StopBeforeWall => last_on_track,
            CrashPolicy::ReturnToStart => self
                .nearest_start(last_on_track)
                .unwrap_or(last_on_track),
        }
    }

    /// Start cell with the shortest rasterized path from `pos`; row-major
    /// order breaks ties.
    fn nearest_start(&self, pos: Position) -> Option<Position> {
        self.starts
            .iter()
            .copied()
            .min_by_key(|&start| path_length(pos, start))
    }
}
