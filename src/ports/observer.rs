//! Observer port - hooks into a training run.
//!
//! Observers receive lifecycle events from the training pipeline without the
//! learning code knowing how they are displayed or stored.

use crate::{
    Result,
    learning::{Algorithm, EpisodeReport, EpochReport},
    pipeline::TrainingResult,
};

/// Observer trait for monitoring training
///
/// Every method has a no-op default so observers only implement the events
/// they care about.
///
/// # Event Sequence
///
/// 1. `on_training_start(algorithm, max_epochs)` - once
/// 2. For each epoch:
///    - `on_episode_end(...)` - after every episode (TD learners only)
///    - `on_epoch_end(report)`
/// 3. `on_training_end(result)` - once, also after an early stop
///
/// # Examples
///
/// ```no_run
/// use racetrack::learning::EpochReport;
/// use racetrack::ports::TrainingObserver;
///
/// struct DeltaPrinter;
///
/// impl TrainingObserver for DeltaPrinter {
///     fn on_epoch_end(&mut self, report: &EpochReport) -> racetrack::Result<()> {
///         println!("epoch {} delta {}", report.epoch, report.delta);
///         Ok(())
///     }
/// }
/// ```
pub trait TrainingObserver: Send {
    /// Called before the first epoch.
    fn on_training_start(&mut self, _algorithm: Algorithm, _max_epochs: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each TD episode.
    ///
    /// # Parameters
    ///
    /// * `epoch` - History index the running epoch will record
    /// * `episode` - Start edge, step count and whether the finish was reached
    fn on_episode_end(&mut self, _epoch: usize, _episode: &EpisodeReport) -> Result<()> {
        Ok(())
    }

    /// Called after the state values of an epoch have been recorded.
    fn on_epoch_end(&mut self, _report: &EpochReport) -> Result<()> {
        Ok(())
    }

    /// Called when training completes, converged or not.
    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        Ok(())
    }
}
