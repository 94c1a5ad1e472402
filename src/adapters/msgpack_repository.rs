//! MessagePack implementation of the track repository.

use std::{fs, path::Path};

use crate::{Result, error::Error, ports::TrackRepository, racetrack::Track};

/// File-backed repository storing tracks as versioned MessagePack.
///
/// # Examples
///
/// ```no_run
/// use racetrack::adapters::MsgPackRepository;
/// use racetrack::ports::TrackRepository;
/// use racetrack::racetrack::{CrashPolicy, Track};
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let track = Track::from_file("tracks/L-track.txt", CrashPolicy::StopBeforeWall)?;
///
/// repo.save(&track, Path::new("L-track.msgpack"))?;
/// let loaded = repo.load(Path::new("L-track.msgpack"))?;
/// # Ok::<(), racetrack::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl TrackRepository for MsgPackRepository {
    fn save(&self, track: &Track, path: &Path) -> Result<()> {
        let bytes = track.to_bytes()?;
        fs::write(path, bytes).map_err(|source| Error::Io {
            operation: format!("write track file {path:?}"),
            source,
        })?;
        log::info!("saved track '{}' to {}", track.name(), path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Track> {
        let bytes = fs::read(path).map_err(|source| Error::Io {
            operation: format!("read track file {path:?}"),
            source,
        })?;
        Track::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::racetrack::{CrashPolicy, Grid};

    fn track() -> Track {
        let grid = Grid::from_rows(&["S.", ".F"]).unwrap();
        Track::build("square", grid, CrashPolicy::StopBeforeWall).unwrap()
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("square.msgpack");

        let repo = MsgPackRepository::new();
        let mut original = track();
        original.update_state_values();

        repo.save(&original, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.load(Path::new("/tmp/nonexistent_racetrack_12345.msgpack"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let repo = MsgPackRepository::new();
        let result = repo.save(&track(), Path::new("/invalid_dir_12345/file.msgpack"));
        assert!(result.is_err());
    }
}
