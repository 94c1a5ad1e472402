//! Byte-level persistence for tracks.
//!
//! Tracks are wrapped in a versioned envelope and encoded as MessagePack.

use serde::{Deserialize, Serialize};

use super::track::Track;
use crate::{Error, Result};

/// Versioned on-disk representation of a [`Track`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    pub version: u32,
    pub track: Track,
}

impl SavedTrack {
    pub const VERSION: u32 = 1;

    pub fn new(track: Track) -> Self {
        Self {
            version: Self::VERSION,
            track,
        }
    }

    /// Unwrap the track, rejecting unknown format versions.
    pub fn into_track(self) -> Result<Track> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(self.track)
    }
}

#[derive(Serialize)]
struct SavedTrackRef<'a> {
    version: u32,
    track: &'a Track,
}

impl Track {
    /// Encode the track and all of its tables.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let saved = SavedTrackRef {
            version: SavedTrack::VERSION,
            track: self,
        };
        rmp_serde::to_vec(&saved).map_err(|e| Error::SerializationContext {
            operation: "serialize track to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    /// Decode a track produced by [`Track::to_bytes`].
    ///
    /// Decoded tables are cross-checked, so ids that point outside them
    /// fail here with [`Error::UnknownState`] or
    /// [`Error::InconsistentTables`] rather than later during training.
    pub fn from_bytes(bytes: &[u8]) -> Result<Track> {
        let saved: SavedTrack =
            rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
                operation: "deserialize track from MessagePack".to_string(),
                message: e.to_string(),
            })?;
        let track = saved.into_track()?;
        track.check_consistency()?;
        Ok(track)
    }
}
