//! Greedy policy evaluation under stochastic acceleration.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    config::EvaluationConfig,
    learning::build_rng,
    racetrack::{CellType, Position, Track, Velocity},
};

/// One evaluation episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub start: Position,
    /// Moves taken; equals the step cap when the finish was not reached.
    pub steps: usize,
    pub reached_finish: bool,
}

/// Step-count statistics over a batch of evaluation episodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub episodes: usize,
    pub finished: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Mean without one minimum and one maximum (plain mean below three episodes).
    pub trimmed_mean: f64,
}

impl StepSummary {
    /// Summarize `outcomes`, or `None` if there are none.
    pub fn from_outcomes(outcomes: &[EpisodeOutcome]) -> Option<Self> {
        let steps: Vec<usize> = outcomes.iter().map(|o| o.steps).collect();
        let min = *steps.iter().min()?;
        let max = *steps.iter().max()?;
        let total: usize = steps.iter().sum();
        let mean = total as f64 / steps.len() as f64;
        let trimmed_mean = if steps.len() > 2 {
            (total - min - max) as f64 / (steps.len() - 2) as f64
        } else {
            mean
        };
        Some(Self {
            episodes: steps.len(),
            finished: outcomes.iter().filter(|o| o.reached_finish).count(),
            min,
            max,
            mean,
            trimmed_mean,
        })
    }
}

/// Drive the greedy policy from random start cells.
///
/// Each episode starts at rest on a uniformly chosen start cell, follows
/// [`Track::best_action`] and takes the success transition with the
/// configured probability, the fail transition otherwise.
pub fn evaluate_policy(track: &Track, config: &EvaluationConfig) -> Result<Vec<EpisodeOutcome>> {
    config.validate()?;
    track.validate()?;

    let starts: Vec<Position> = track.grid().positions_of(CellType::Start).collect();
    let mut rng = build_rng(config.seed);
    let mut outcomes = Vec::with_capacity(config.episodes);

    for _ in 0..config.episodes {
        let start = *starts.choose(&mut rng).ok_or(Error::MissingTerminal {
            cell: CellType::Start,
        })?;
        let mut state = track.states().require(start, Velocity::ZERO)?;
        let mut outcome = EpisodeOutcome {
            start,
            steps: 0,
            reached_finish: false,
        };

        while outcome.steps < config.max_steps {
            let Some(edge) = track.best_action(state) else {
                break;
            };
            outcome.steps += 1;
            let edge = track.edge(edge);
            let transition = if rng.random::<f64>() < config.success_probability {
                edge.success
            } else {
                edge.fail
            };
            if transition.reaches_finish() {
                outcome.reached_finish = true;
                break;
            }
            state = transition.state;
        }
        outcomes.push(outcome);
    }

    let finished = outcomes.iter().filter(|o| o.reached_finish).count();
    log::info!(
        "evaluated track '{}': {finished}/{} episodes finished",
        track.name(),
        outcomes.len()
    );
    Ok(outcomes)
}
