//! Error types for the racetrack crate

use thiserror::Error;

use crate::racetrack::CellType;

/// Main error type for the racetrack crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed track at line {line}: {reason}")]
    MalformedTrack { line: usize, reason: String },

    #[error("track has no {cell} cell")]
    MissingTerminal { cell: CellType },

    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("no state for position ({x}, {y}) with velocity ({x_vel}, {y_vel})")]
    UnmappedState {
        x: i32,
        y: i32,
        x_vel: i32,
        y_vel: i32,
    },

    #[error("state {state} does not exist (state space has {len} states)")]
    UnknownState { state: usize, len: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("inconsistent track tables: {message}")]
    InconsistentTables { message: String },

    #[error("unsupported track format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("invalid algorithm '{input}'. Expected one of: {expected}")]
    ParseAlgorithm { input: String, expected: String },

    #[error("invalid crash policy '{input}'. Expected one of: {expected}")]
    ParseCrashPolicy { input: String, expected: String },

    #[error("invalid start selection '{input}'. Expected one of: {expected}")]
    ParseStartSelection { input: String, expected: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
