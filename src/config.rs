//! Training and evaluation parameters.
//!
//! Both configs deserialize from JSON with every field optional, so a file
//! only needs the values it overrides:
//!
//! ```
//! use racetrack::config::TrainingConfig;
//! use racetrack::learning::Algorithm;
//!
//! let config: TrainingConfig =
//!     serde_json::from_str(r#"{ "algorithm": "sarsa", "epsilon": 0.1 }"#)?;
//! assert_eq!(config.algorithm, Algorithm::Sarsa);
//! assert_eq!(config.discount, 0.9);
//! # Ok::<(), serde_json::Error>(())
//! ```

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    learning::{Algorithm, StartSelection},
};

/// Parameters of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub algorithm: Algorithm,
    /// Discount factor γ, in `(0, 1]`.
    pub discount: f64,
    /// Learning-rate decay constant: `lr = tau / (tau + visits)`.
    pub tau: f64,
    /// Exploration probability for TD learners.
    pub epsilon: f64,
    /// TD episodes between convergence checks.
    pub episodes_per_epoch: usize,
    /// Step cap per TD episode.
    pub max_steps_per_episode: usize,
    pub max_epochs: usize,
    /// Stop once successive value aggregates differ by less than this.
    pub threshold: f64,
    /// Probability that an acceleration is applied (Value Iteration backup).
    pub success_probability: f64,
    pub start_selection: StartSelection,
    /// TD q-values are seeded uniformly from `[-q_init_scale, 0)`.
    pub q_init_scale: f64,
    /// Clear learned values before training.
    pub reset: bool,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            discount: 0.9,
            tau: 100.0,
            epsilon: 0.2,
            episodes_per_epoch: 11,
            max_steps_per_episode: 1000,
            max_epochs: 1000,
            threshold: 0.001,
            success_probability: 0.8,
            start_selection: StartSelection::default(),
            q_init_scale: 0.01,
            reset: false,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_episodes_per_epoch(mut self, episodes: usize) -> Self {
        self.episodes_per_epoch = episodes;
        self
    }

    pub fn with_max_steps_per_episode(mut self, steps: usize) -> Self {
        self.max_steps_per_episode = steps;
        self
    }

    pub fn with_max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_success_probability(mut self, probability: f64) -> Self {
        self.success_probability = probability;
        self
    }

    pub fn with_start_selection(mut self, selection: StartSelection) -> Self {
        self.start_selection = selection;
        self
    }

    pub fn with_q_init_scale(mut self, scale: f64) -> Self {
        self.q_init_scale = scale;
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject parameter combinations the learners cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return invalid(format!("discount must be in (0, 1], got {}", self.discount));
        }
        if !(self.tau > 0.0) {
            return invalid(format!("tau must be positive, got {}", self.tau));
        }
        check_probability("epsilon", self.epsilon)?;
        check_probability("success_probability", self.success_probability)?;
        if self.episodes_per_epoch == 0 {
            return invalid("episodes_per_epoch must be at least 1".to_string());
        }
        if self.max_steps_per_episode == 0 {
            return invalid("max_steps_per_episode must be at least 1".to_string());
        }
        if self.max_epochs == 0 {
            return invalid("max_epochs must be at least 1".to_string());
        }
        if !(self.threshold >= 0.0) {
            return invalid(format!("threshold must be non-negative, got {}", self.threshold));
        }
        if !(self.q_init_scale >= 0.0) {
            return invalid(format!(
                "q_init_scale must be non-negative, got {}",
                self.q_init_scale
            ));
        }
        Ok(())
    }

    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref())
    }
}

/// Parameters of a policy evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub episodes: usize,
    /// Episodes still running after this many steps are reported unfinished.
    pub max_steps: usize,
    pub success_probability: f64,
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            max_steps: 200,
            success_probability: 0.8,
            seed: None,
        }
    }
}

impl EvaluationConfig {
    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_success_probability(mut self, probability: f64) -> Self {
        self.success_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return invalid("episodes must be at least 1".to_string());
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be at least 1".to_string());
        }
        check_probability("success_probability", self.success_probability)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref())
    }
}

fn invalid(message: String) -> Result<()> {
    Err(Error::InvalidConfiguration { message })
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(format!("{name} must be in [0, 1], got {value}"))
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| Error::Io {
        operation: format!("open config file {path:?}"),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
