//! Command implementations for the racetrack CLI

pub mod evaluate;
pub mod export;
pub mod inspect;
pub mod train;

use std::path::Path;

use anyhow::{Context, Result};

use crate::{
    adapters::MsgPackRepository,
    ports::TrackRepository,
    racetrack::{CrashPolicy, Track},
};

const SAVED_TRACK_EXTENSIONS: [&str; 2] = ["msgpack", "mp"];

/// Whether `path` names a saved (MessagePack) track rather than a text grid.
pub(crate) fn is_saved_track(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SAVED_TRACK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Load a saved track, or build one from a text grid file.
///
/// `crash_policy` only applies to text grids; saved tracks keep the policy
/// they were built with.
pub(crate) fn load_track(path: &Path, crash_policy: CrashPolicy) -> Result<Track> {
    if is_saved_track(path) {
        MsgPackRepository::new()
            .load(path)
            .with_context(|| format!("Failed to load saved track from {}", path.display()))
    } else {
        Track::from_file(path, crash_policy)
            .with_context(|| format!("Failed to build track from {}", path.display()))
    }
}
