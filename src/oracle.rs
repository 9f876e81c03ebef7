//! Distance oracle consumed by the search engines.
//!
//! The engines never own distances, budgets or randomness. Everything they
//! need from the outside world goes through [`DistanceOracle`], which keeps
//! them reproducible for a fixed seed and lets the caller decide when a
//! search has to stop.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use crate::problem::{NodeId, Problem};

/// Interface between the search engines and the objective.
pub trait DistanceOracle {
    /// Random source handed to the engines.
    type Random: Rng;

    /// Number of cities.
    fn n(&self) -> usize;

    /// Nonnegative distance between two cities.
    fn distance(&self, a: NodeId, b: NodeId) -> i64;

    /// Length of the closed tour visiting `nodes` in order.
    fn tour_length(&self, nodes: &[NodeId]) -> i64 {
        if nodes.len() < 2 {
            return 0;
        }
        let closing = self.distance(nodes[nodes.len() - 1], nodes[0]);
        nodes
            .windows(2)
            .map(|w| self.distance(w[0], w[1]))
            .sum::<i64>()
            + closing
    }

    /// Whether the caller's budget is exhausted. Once true, stays true.
    fn should_terminate(&self) -> bool;

    /// Record an accepted tour and its length.
    fn register_evaluation(&mut self, nodes: &[NodeId], length: i64);

    /// The injected random source.
    fn rng(&mut self) -> &mut Self::Random;
}

/// Limits after which an [`Evaluator`] asks the engines to stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Budget {
    pub max_evaluations: Option<u64>,
    pub time_limit: Option<Duration>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Budget::default()
    }

    pub fn with_max_evaluations(mut self, evaluations: u64) -> Self {
        self.max_evaluations = Some(evaluations);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

/// Budgeted oracle over a [`Problem`].
///
/// Counts evaluations, remembers the best tour registered so far and owns a
/// seeded ChaCha random source.
pub struct Evaluator<'a> {
    problem: &'a Problem,
    budget: Budget,
    evaluations: u64,
    started: Instant,
    best_length: Option<i64>,
    best_tour: Vec<NodeId>,
    rng: ChaCha8Rng,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with the given budget and random seed.
    pub fn new(problem: &'a Problem, budget: Budget, seed: u64) -> Self {
        Evaluator {
            problem,
            budget,
            evaluations: 0,
            started: Instant::now(),
            best_length: None,
            best_tour: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Evaluator without any budget.
    pub fn unlimited(problem: &'a Problem, seed: u64) -> Self {
        Self::new(problem, Budget::unlimited(), seed)
    }

    /// Number of evaluations registered so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Best registered tour and its length.
    pub fn best(&self) -> Option<(&[NodeId], i64)> {
        self.best_length.map(|len| (self.best_tour.as_slice(), len))
    }
}

impl DistanceOracle for Evaluator<'_> {
    type Random = ChaCha8Rng;

    fn n(&self) -> usize {
        self.problem.dimension()
    }

    #[inline]
    fn distance(&self, a: NodeId, b: NodeId) -> i64 {
        self.problem.distance(a, b)
    }

    fn should_terminate(&self) -> bool {
        if let Some(max) = self.budget.max_evaluations {
            if self.evaluations >= max {
                return true;
            }
        }

        if let Some(limit) = self.budget.time_limit {
            if self.started.elapsed() >= limit {
                return true;
            }
        }

        false
    }

    fn register_evaluation(&mut self, nodes: &[NodeId], length: i64) {
        self.evaluations += 1;
        if self.best_length.map_or(true, |best| length < best) {
            self.best_length = Some(length);
            self.best_tour.clear();
            self.best_tour.extend_from_slice(nodes);
        }
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}
