//! Reinforcement learning on racetrack grids
//!
//! This crate provides:
//! - Track parsing, Bresenham rasterization and collision resolution
//! - Precomputed state and action tables over position and velocity
//! - Value Iteration, Q-Learning and SARSA sharing one training loop
//! - Policy evaluation, warm starts and persistence of trained tracks

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod identifiers;
pub mod learning;
pub mod pipeline;
pub mod ports;
pub mod racetrack;

pub use config::{EvaluationConfig, TrainingConfig};
pub use error::{Error, Result};
pub use identifiers::{EdgeId, StateId};
pub use learning::Algorithm;
pub use racetrack::{CrashPolicy, Grid, Track};
