//! Learning algorithm and episode-start strategy selectors.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The three learners sharing the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Synchronous Bellman backup over the whole action table.
    #[default]
    ValueIteration,
    /// Off-policy TD control, bootstraps from the greedy successor edge.
    QLearning,
    /// On-policy TD control, bootstraps from the edge actually chosen.
    Sarsa,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::ValueIteration,
        Algorithm::QLearning,
        Algorithm::Sarsa,
    ];

    /// Whether the algorithm learns from sampled episodes.
    pub fn is_episodic(self) -> bool {
        !matches!(self, Algorithm::ValueIteration)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Algorithm::ValueIteration => "value-iteration",
            Algorithm::QLearning => "q-learning",
            Algorithm::Sarsa => "sarsa",
        };
        f.write_str(label)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value-iteration" | "value_iteration" | "vi" => Ok(Algorithm::ValueIteration),
            "q-learning" | "q_learning" | "qlearning" | "q" => Ok(Algorithm::QLearning),
            "sarsa" => Ok(Algorithm::Sarsa),
            _ => Err(Error::ParseAlgorithm {
                input: s.to_string(),
                expected: "value-iteration, q-learning, sarsa".to_string(),
            }),
        }
    }
}

/// How a TD episode picks its first edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSelection {
    /// Any edge leaving a start cell, at any velocity, uniformly.
    #[default]
    Random,
    /// Greedy edge of a resting state on a randomly chosen start cell.
    Best,
}

impl fmt::Display for StartSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartSelection::Random => f.write_str("random"),
            StartSelection::Best => f.write_str("best"),
        }
    }
}

impl FromStr for StartSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" | "uniform" => Ok(StartSelection::Random),
            "best" | "greedy" => Ok(StartSelection::Best),
            _ => Err(Error::ParseStartSelection {
                input: s.to_string(),
                expected: "random, best".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_display_roundtrips_through_from_str() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert_eq!("VI".parse::<Algorithm>().unwrap(), Algorithm::ValueIteration);
        assert!(matches!(
            "td-lambda".parse::<Algorithm>(),
            Err(Error::ParseAlgorithm { .. })
        ));
    }

    #[test]
    fn test_start_selection_parsing() {
        assert_eq!("Best".parse::<StartSelection>().unwrap(), StartSelection::Best);
        assert_eq!(" random ".parse::<StartSelection>().unwrap(), StartSelection::Random);
        assert!("first".parse::<StartSelection>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Algorithm::QLearning).unwrap();
        assert_eq!(json, "\"q_learning\"");
        assert!(Algorithm::Sarsa.is_episodic());
        assert!(!Algorithm::ValueIteration.is_episodic());
    }
}
