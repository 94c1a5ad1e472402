//! Ports (trait boundaries) for external dependencies.
//!
//! The learning core owns these traits; adapters and pipeline observers
//! implement them.

pub mod observer;
pub mod repository;

pub use observer::TrainingObserver;
pub use repository::TrackRepository;
