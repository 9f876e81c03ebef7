//! # tsp-moves
//!
//! Incremental local search for the symmetric Traveling Salesman Problem.
//!
//! Two improvement engines operate on a [`Tour`] through a
//! [`DistanceOracle`](oracle::DistanceOracle):
//!
//! * [`mns::Mns`], a Multi-Neighborhood Search over four array operators
//!   (segment reversal, single-city rotations and city swap) that keeps a
//!   queue of improving moves up to date across applications instead of
//!   re-scanning the whole neighborhood;
//! * [`lin_kernighan::LinKernighan`], a Lin-Kernighan search over an edge-set
//!   representation in a full and a candidate-list variant.
//!
//! [`Improver`] ties a [`Problem`], a [`Config`] and an engine together.

pub mod candidates;
pub mod config;
pub mod edge_set;
pub mod error;
pub mod lin_kernighan;
pub mod mns;
pub mod oracle;
pub mod problem;
pub mod tour;
pub mod utils;
pub mod window;

pub use crate::config::{Algorithm, Config, MoveOrder};
pub use crate::error::{Error, Result};
pub use crate::problem::{NodeId, Problem};
pub use crate::tour::Tour;

use log::{info, warn};
use std::time::{Duration, Instant};

use crate::lin_kernighan::LinKernighan;
use crate::mns::Mns;
use crate::oracle::{Budget, Evaluator};
use crate::utils::SearchStatistics;

/// How a local search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No operator of the engine improves the tour any more
    LocalOptimum,
    /// The oracle asked the engine to stop
    Terminated,
}

/// Runs one engine on one problem under the budget of a configuration.
pub struct Improver {
    pub problem: Problem,
    pub config: Config,
    pub best_tour: Option<Tour>,
    pub run_time: Duration,
    pub outcome: Option<Outcome>,
    pub evaluations: u64,
    pub initial_length: i64,
}

impl Improver {
    /// Create an improver for the given problem and configuration.
    pub fn new(problem: Problem, config: Config) -> Self {
        Improver {
            problem,
            config,
            best_tour: None,
            run_time: Duration::from_secs(0),
            outcome: None,
            evaluations: 0,
            initial_length: 0,
        }
    }

    /// Improve a random (or identity) start tour, as configured.
    pub fn run(&mut self) -> Result<&Tour> {
        self.config.validate()?;
        let mut oracle = evaluator(&self.problem, &self.config);
        let start = if self.config.random_initial_tour {
            Tour::random(&mut oracle)
        } else {
            Tour::identity(&oracle)
        };
        let run = improve(&self.problem.name, &self.config, start, oracle);
        Ok(self.record(run))
    }

    /// Improve the given start tour.
    pub fn run_from(&mut self, nodes: Vec<NodeId>) -> Result<&Tour> {
        self.config.validate()?;
        let oracle = evaluator(&self.problem, &self.config);
        let start = Tour::new(nodes, &oracle)?;
        let run = improve(&self.problem.name, &self.config, start, oracle);
        Ok(self.record(run))
    }

    /// Statistics of the last run, if any.
    pub fn statistics(&self) -> Option<SearchStatistics> {
        let tour = self.best_tour.as_ref()?;
        Some(SearchStatistics {
            algorithm: self.config.algorithm,
            outcome: self.outcome?,
            evaluations: self.evaluations,
            runtime: self.run_time,
            initial_length: self.initial_length,
            final_length: tour.length,
        })
    }

    fn record(&mut self, run: Run) -> &Tour {
        self.run_time = run.run_time;
        self.outcome = Some(run.outcome);
        self.evaluations = run.evaluations;
        self.initial_length = run.initial_length;
        self.best_tour.insert(run.tour)
    }
}

/// Result of a single engine run.
struct Run {
    tour: Tour,
    outcome: Outcome,
    evaluations: u64,
    initial_length: i64,
    run_time: Duration,
}

fn evaluator<'a>(problem: &'a Problem, config: &Config) -> Evaluator<'a> {
    let mut budget = Budget::unlimited();
    if let Some(max) = config.max_evaluations {
        budget = budget.with_max_evaluations(max);
    }
    if let Some(limit) = config.time_limit {
        budget = budget.with_time_limit(limit);
    }
    Evaluator::new(problem, budget, config.seed)
}

fn improve(name: &str, config: &Config, mut tour: Tour, mut oracle: Evaluator<'_>) -> Run {
    let start_time = Instant::now();
    let initial_length = tour.length;
    info!(
        "{}: {} cities, {:?}, start length {}",
        name,
        tour.len(),
        config.algorithm,
        initial_length
    );

    let outcome = match config.algorithm {
        Algorithm::Mns => Mns::from_config(config).local_search(&mut tour, &mut oracle),
        Algorithm::LinKernighan | Algorithm::LinKernighanCandidates => {
            LinKernighan::from_config(config).local_search(&mut tour, &mut oracle)
        }
    };

    if !tour.is_consistent(&oracle) {
        warn!("cached tour length drifted; recomputing");
        tour.recompute_length(&oracle);
    }
    if outcome == Outcome::Terminated {
        warn!(
            "search stopped by budget after {} evaluations",
            oracle.evaluations()
        );
    }

    let run_time = start_time.elapsed();
    info!(
        "finished with length {} ({:?}) after {} evaluations in {:.2?}",
        tour.length,
        outcome,
        oracle.evaluations(),
        run_time
    );

    Run {
        evaluations: oracle.evaluations(),
        tour,
        outcome,
        initial_length,
        run_time,
    }
}
