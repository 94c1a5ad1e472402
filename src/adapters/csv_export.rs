//! CSV export of a track's state table, action table and convergence history.
//!
//! Rows are keyed by the stable state and edge ids, so files exported from
//! the same grid line up across runs.

use std::{fs, path::Path};

use serde::Serialize;

use crate::{
    Result,
    error::Error,
    racetrack::{ActionEdge, State, Track},
};

pub const STATES_FILE: &str = "states.csv";
pub const ACTIONS_FILE: &str = "actions.csv";
pub const HISTORY_FILE: &str = "history.csv";

/// A single row of `states.csv`
#[derive(Debug, Clone, Serialize)]
pub struct StateRecord {
    pub state_id: usize,
    pub x: i32,
    pub y: i32,
    pub x_vel: i32,
    pub y_vel: i32,
    pub cell: char,
    pub value: f64,
}

impl From<&State> for StateRecord {
    fn from(state: &State) -> Self {
        Self {
            state_id: state.id.index(),
            x: state.position.x,
            y: state.position.y,
            x_vel: state.velocity.x,
            y_vel: state.velocity.y,
            cell: state.cell.as_char(),
            value: state.value,
        }
    }
}

/// A single row of `actions.csv`
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub edge_id: usize,
    pub state_id: usize,
    pub x_accel: i32,
    pub y_accel: i32,
    pub success_state: usize,
    pub success_landing: char,
    pub fail_state: usize,
    pub fail_landing: char,
    pub q_value: f64,
    pub times_visited: u32,
    pub learning_rate: f64,
}

impl From<&ActionEdge> for ActionRecord {
    fn from(edge: &ActionEdge) -> Self {
        Self {
            edge_id: edge.id.index(),
            state_id: edge.state.index(),
            x_accel: edge.acceleration.x,
            y_accel: edge.acceleration.y,
            success_state: edge.success.state.index(),
            success_landing: edge.success.landing.as_char(),
            fail_state: edge.fail.state.index(),
            fail_landing: edge.fail.landing.as_char(),
            q_value: edge.q_value,
            times_visited: edge.times_visited,
            learning_rate: edge.learning_rate,
        }
    }
}

/// Row counts written by [`CsvExporter::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub states: usize,
    pub actions: usize,
    pub history: usize,
}

/// Exporter for track CSV tables
pub struct CsvExporter;

impl CsvExporter {
    /// Write `states.csv`, `actions.csv` and `history.csv` into `out_dir`,
    /// creating it if needed.
    pub fn export(track: &Track, out_dir: &Path) -> Result<ExportSummary> {
        fs::create_dir_all(out_dir).map_err(|source| Error::Io {
            operation: format!("create export directory {out_dir:?}"),
            source,
        })?;

        let states = write_records(
            &out_dir.join(STATES_FILE),
            track.states().iter().map(StateRecord::from),
        )?;
        let actions = write_records(
            &out_dir.join(ACTIONS_FILE),
            track.actions().iter().map(ActionRecord::from),
        )?;
        let history = write_records(
            &out_dir.join(HISTORY_FILE),
            track.history().samples().iter(),
        )?;

        log::info!(
            "exported track '{}' to {}: {states} states, {actions} actions, {history} history rows",
            track.name(),
            out_dir.display()
        );
        Ok(ExportSummary {
            states,
            actions,
            history,
        })
    }
}

fn write_records<T, I>(path: &Path, records: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0;
    for record in records {
        writer.serialize(record)?;
        count += 1;
    }
    writer.flush().map_err(|source| Error::Io {
        operation: format!("flush {path:?}"),
        source,
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::racetrack::{CrashPolicy, Grid};

    #[test]
    fn test_export_writes_all_tables() {
        let grid = Grid::from_rows(&["S.F"]).unwrap();
        let mut track = Track::build("line", grid, CrashPolicy::StopBeforeWall).unwrap();
        track.update_state_values();
        track.update_state_values();

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("tables");
        let summary = CsvExporter::export(&track, &out).unwrap();

        assert_eq!(summary.states, track.states().len());
        assert_eq!(summary.actions, track.actions().len());
        assert_eq!(summary.history, 2);

        let states = fs::read_to_string(out.join(STATES_FILE)).unwrap();
        let mut lines = states.lines();
        assert_eq!(lines.next(), Some("state_id,x,y,x_vel,y_vel,cell,value"));
        assert!(lines.next().unwrap().starts_with("0,0,0,-5,-5,S,"));

        let history = fs::read_to_string(out.join(HISTORY_FILE)).unwrap();
        let mut lines = history.lines();
        assert_eq!(lines.next(), Some("epoch,aggregate_value"));
        assert!(lines.next().unwrap().starts_with("0,"));
    }
}
