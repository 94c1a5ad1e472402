//! Repository port for track persistence.

use std::path::Path;

use crate::{Result, racetrack::Track};

/// Port for persisting and loading built (and possibly trained) tracks.
///
/// Building the action table is the expensive step, so tracks are meant to
/// be built once, saved, and reloaded for every later training or
/// evaluation run. Implementations must reproduce state and edge ids
/// exactly.
///
/// # Examples
///
/// ```no_run
/// use racetrack::ports::TrackRepository;
/// use racetrack::racetrack::Track;
/// use std::path::Path;
///
/// fn checkpoint<R: TrackRepository>(repo: &R, track: &Track) -> racetrack::Result<()> {
///     repo.save(track, Path::new("checkpoints/L-track.msgpack"))
/// }
/// ```
pub trait TrackRepository {
    /// Save a track with all of its tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or serialization
    /// fails.
    fn save(&self, track: &Track, path: &Path) -> Result<()>;

    /// Load a previously saved track.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was saved at `path`, the data is corrupt,
    /// or it was written by an unsupported format version.
    fn load(&self, path: &Path) -> Result<Track>;
}
