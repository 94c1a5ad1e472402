//! In-memory track repository for testing.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, error::Error, ports::TrackRepository, racetrack::Track};

/// Repository keeping encoded tracks in a shared map instead of on disk.
///
/// Tracks go through the same MessagePack encoding as the file repository,
/// so a round-trip here exercises the real format.
///
/// ```
/// use racetrack::adapters::InMemoryRepository;
/// use racetrack::ports::TrackRepository;
/// use racetrack::racetrack::{CrashPolicy, Grid, Track};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let track = Track::build("tiny", Grid::from_rows(&["SF"])?, CrashPolicy::StopBeforeWall)?;
///
/// repo.save(&track, Path::new("tiny"))?;
/// assert_eq!(repo.load(Path::new("tiny"))?, track);
/// # Ok::<(), racetrack::Error>(())
/// ```
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracks currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl TrackRepository for InMemoryRepository {
    fn save(&self, track: &Track, path: &Path) -> Result<()> {
        let bytes = track.to_bytes()?;
        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Track> {
        let storage = self.storage();
        let bytes = storage.get(&key(path)).ok_or_else(|| Error::Io {
            operation: format!("load track from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;
        Track::from_bytes(bytes)
    }
}
