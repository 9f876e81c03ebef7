//! Exhaustive optimization of short tour windows.
//!
//! A window is `w` consecutive positions (cyclically). Its two end cities
//! stay in place while every ordering of the `w - 2` cities between them is
//! tried. Once a full pass over all windows finds nothing, no move that only
//! rearranges the interior of a span of at most `w` positions can improve
//! the tour. MNS uses this to skip such spans on its next full fill.

use itertools::Itertools;
use log::{debug, trace};
use rand::seq::SliceRandom;

use crate::oracle::DistanceOracle;
use crate::problem::NodeId;
use crate::tour::Tour;
use crate::Outcome;

/// Result of one pass over all windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Improved,
    Unchanged,
    Terminated,
}

/// Companion window optimizer run alongside MNS.
#[derive(Debug, Clone)]
pub struct WindowOptimizer {
    size: usize,
    random_overlap: bool,
    starts: Vec<usize>,
    window: Vec<NodeId>,
}

impl WindowOptimizer {
    /// `size` must be at least 4 so that a window has two interior cities.
    pub fn new(size: usize, random_overlap: bool) -> Self {
        debug_assert!(size >= 4);
        WindowOptimizer {
            size,
            random_overlap,
            starts: Vec::new(),
            window: Vec::with_capacity(size),
        }
    }

    /// Configured window size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Window size actually used on a tour of `n` cities.
    pub fn effective_size(&self, n: usize) -> usize {
        self.size.min(n)
    }

    /// Repeat passes until one finds no improvement.
    pub fn converge<O: DistanceOracle>(&mut self, tour: &mut Tour, oracle: &mut O) -> Outcome {
        let mut passes = 0;
        loop {
            passes += 1;
            match self.pass(tour, oracle) {
                Pass::Improved => continue,
                Pass::Unchanged => {
                    debug!("window optimizer converged after {} passes", passes);
                    return Outcome::LocalOptimum;
                }
                Pass::Terminated => return Outcome::Terminated,
            }
        }
    }

    /// Optimize every window once.
    pub fn pass<O: DistanceOracle>(&mut self, tour: &mut Tour, oracle: &mut O) -> Pass {
        let n = tour.len();
        let w = self.effective_size(n);
        if w < 4 {
            return Pass::Unchanged;
        }

        self.starts.clear();
        self.starts.extend(0..n);
        if self.random_overlap {
            self.starts.shuffle(oracle.rng());
        }

        let mut improved = false;
        for k in 0..self.starts.len() {
            if oracle.should_terminate() {
                return Pass::Terminated;
            }
            let start = self.starts[k];
            if self.optimize_window(tour, start, w, oracle) {
                improved = true;
            }
        }

        if improved {
            Pass::Improved
        } else {
            Pass::Unchanged
        }
    }

    /// Try every interior ordering of the window starting at `start`.
    fn optimize_window<O: DistanceOracle>(
        &mut self,
        tour: &mut Tour,
        start: usize,
        w: usize,
        oracle: &mut O,
    ) -> bool {
        let n = tour.len();
        self.window.clear();
        self.window
            .extend((0..w).map(|k| tour.nodes[(start + k) % n]));

        let first = self.window[0];
        let last = self.window[w - 1];
        let path_cost = |inner: &[NodeId]| -> i64 {
            let mut cost = oracle.distance(first, inner[0]);
            for pair in inner.windows(2) {
                cost += oracle.distance(pair[0], pair[1]);
            }
            cost + oracle.distance(inner[inner.len() - 1], last)
        };

        let current = path_cost(&self.window[1..w - 1]);
        let best = self.window[1..w - 1]
            .iter()
            .copied()
            .permutations(w - 2)
            .map(|inner| (path_cost(&inner), inner))
            .min_by_key(|(cost, _)| *cost);

        let Some((best_cost, inner)) = best else {
            return false;
        };
        if best_cost >= current {
            return false;
        }

        for (k, &node) in inner.iter().enumerate() {
            tour.nodes[(start + 1 + k) % n] = node;
        }
        tour.length += best_cost - current;
        trace!(
            "window at {} improved by {}, length {}",
            start,
            current - best_cost,
            tour.length
        );
        oracle.register_evaluation(&tour.nodes, tour.length);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Evaluator;
    use crate::problem::{Metric, Problem};

    fn line(n: usize) -> Problem {
        Problem::from_coordinates(
            "line".into(),
            (0..n).map(|i| (10.0 * i as f64, 0.0)).collect(),
            Metric::Euclidean,
        )
    }

    #[test]
    fn fixes_a_local_detour() {
        let problem = line(8);
        let mut oracle = Evaluator::unlimited(&problem, 0);
        let mut tour = Tour::new(vec![1, 3, 2, 4, 5, 6, 7, 8], &oracle).unwrap();
        let before = tour.length;

        let mut optimizer = WindowOptimizer::new(5, false);
        assert_eq!(optimizer.converge(&mut tour, &mut oracle), Outcome::LocalOptimum);
        assert!(tour.length < before);
        assert!(tour.is_consistent(&oracle));
        assert_eq!(tour.length, 140);
    }

    #[test]
    fn random_overlap_keeps_tour_valid() {
        let problem = line(9);
        let mut oracle = Evaluator::unlimited(&problem, 3);
        let mut tour = Tour::random(&mut oracle);
        let before = tour.length;

        let mut optimizer = WindowOptimizer::new(4, true);
        optimizer.converge(&mut tour, &mut oracle);
        assert!(tour.length <= before);
        assert!(tour.is_consistent(&oracle));
    }

    #[test]
    fn optimal_tour_is_untouched() {
        let problem = line(6);
        let mut oracle = Evaluator::unlimited(&problem, 0);
        let mut tour = Tour::identity(&oracle);
        let snapshot = tour.clone();

        let mut optimizer = WindowOptimizer::new(6, false);
        assert_eq!(optimizer.pass(&mut tour, &mut oracle), Pass::Unchanged);
        assert_eq!(tour, snapshot);
        assert_eq!(oracle.evaluations(), 0);
    }
}
