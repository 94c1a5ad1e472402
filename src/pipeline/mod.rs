//! Training pipeline
//!
//! This module provides:
//! - The shared epoch loop driving Value Iteration, Q-Learning and SARSA
//! - Observers recording progress and metrics during training

pub mod observers;
pub mod training;

pub use observers::{JsonlObserver, LogObserver, MetricsObserver, MetricsSummary, ProgressObserver};
pub use training::{TrainingPipeline, TrainingResult};

pub use crate::ports::TrainingObserver;
