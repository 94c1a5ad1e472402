//! CLI infrastructure for the racetrack toolkit
//!
//! Commands for building tracks, training and evaluating policies on them,
//! and exporting the learned tables.

pub mod commands;
pub mod output;
