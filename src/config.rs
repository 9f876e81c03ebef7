//! Configuration parameters for the local search engines.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Which improvement engine the [`Improver`](crate::Improver) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Multi-Neighborhood Search over the incremental move queue
    Mns,
    /// Lin-Kernighan with unrestricted edge additions
    LinKernighan,
    /// Lin-Kernighan sampling additions from nearest-neighbor candidate lists
    LinKernighanCandidates,
}

/// Ordering policy of the MNS move queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrder {
    /// Most negative delta first
    BestDelta,
    /// Grouped by move type (reverse, rotations, swap), then by delta
    TypeThenDelta,
}

/// Configuration settings for a local search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine used to improve the tour
    pub algorithm: Algorithm,
    /// Comparator policy for the MNS move queue
    pub move_order: MoveOrder,
    /// Maximum number of pooled move records
    pub max_moves: usize,
    /// Size of the nearest-neighbor pool sampled by candidate-list LK
    pub candidate_list_size: usize,
    /// Window size of the companion exhaustive optimizer run alongside MNS
    pub window_size: Option<usize>,
    /// Visit companion windows in random order
    pub random_overlap: bool,
    /// Optional cap on registered evaluations
    pub max_evaluations: Option<u64>,
    /// Optional time limit for the search
    pub time_limit: Option<Duration>,
    /// Seed of the random source
    pub seed: u64,
    /// Start from a random permutation instead of the identity tour
    pub random_initial_tour: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            algorithm: Algorithm::Mns,
            move_order: MoveOrder::BestDelta,
            max_moves: 10_000,
            candidate_list_size: 20,
            window_size: None,
            random_overlap: false,
            max_evaluations: None,
            time_limit: None,
            seed: 0,
            random_initial_tour: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the parameters for values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_moves == 0 {
            return Err(Error::InvalidConfig("max_moves must be positive".into()));
        }
        if self.candidate_list_size == 0 {
            return Err(Error::InvalidConfig(
                "candidate_list_size must be positive".into(),
            ));
        }
        if let Some(w) = self.window_size {
            if w < 4 {
                return Err(Error::InvalidConfig(format!(
                    "window_size must be at least 4, got {}",
                    w
                )));
            }
        }
        Ok(())
    }

    /// Set the improvement engine.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the move queue ordering.
    pub fn with_move_order(mut self, order: MoveOrder) -> Self {
        self.move_order = order;
        self
    }

    /// Set the move pool capacity.
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    /// Set the candidate list size for candidate-list LK.
    pub fn with_candidate_list_size(mut self, m: usize) -> Self {
        self.candidate_list_size = m;
        self
    }

    /// Enable the companion window optimizer with the given window size.
    pub fn with_window_size(mut self, w: usize) -> Self {
        self.window_size = Some(w);
        self
    }

    /// Randomize the window visiting order of the companion optimizer.
    pub fn with_random_overlap(mut self, random_overlap: bool) -> Self {
        self.random_overlap = random_overlap;
        self
    }

    /// Set the evaluation budget.
    pub fn with_max_evaluations(mut self, evaluations: u64) -> Self {
        self.max_evaluations = Some(evaluations);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the time limit from a number of seconds.
    pub fn with_time_limit_secs(self, secs: f64) -> Result<Self> {
        let duration = Duration::try_from_secs_f64(secs).map_err(|e| {
            Error::InvalidConfig(format!("time limit {} seconds: {}", secs, e))
        })?;
        Ok(self.with_time_limit(duration))
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Choose between a random and an identity initial tour.
    pub fn with_random_initial_tour(mut self, random: bool) -> Self {
        self.random_initial_tour = random;
        self
    }
}
