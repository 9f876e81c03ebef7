//! Tour representation for the TSP.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::oracle::DistanceOracle;
use crate::problem::NodeId;

/// A closed tour: a permutation of the ids `1..=n` with its cached length.
///
/// Position `n - 1` connects back to position `0`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    /// Cities in visiting order
    pub nodes: Vec<NodeId>,
    /// Total length of the closed tour
    pub length: i64,
}

impl Tour {
    /// Create a tour from a visiting order, validating it against the oracle.
    pub fn new<O: DistanceOracle>(nodes: Vec<NodeId>, oracle: &O) -> Result<Self> {
        if nodes.len() != oracle.n() {
            return Err(Error::InvalidTour(format!(
                "expected {} cities, got {}",
                oracle.n(),
                nodes.len()
            )));
        }
        if let Some(problem) = first_permutation_error(&nodes) {
            return Err(Error::InvalidTour(problem));
        }

        let length = oracle.tour_length(&nodes);
        Ok(Tour { nodes, length })
    }

    /// The tour `1, 2, ..., n`.
    pub fn identity<O: DistanceOracle>(oracle: &O) -> Self {
        let nodes: Vec<NodeId> = (1..=oracle.n()).collect();
        let length = oracle.tour_length(&nodes);
        Tour { nodes, length }
    }

    /// A uniformly random tour drawn from the oracle's random source.
    pub fn random<O: DistanceOracle>(oracle: &mut O) -> Self {
        let mut nodes: Vec<NodeId> = (1..=oracle.n()).collect();
        nodes.shuffle(oracle.rng());
        let length = oracle.tour_length(&nodes);
        Tour { nodes, length }
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that the tour visits every id in `1..=n` exactly once.
    pub fn is_valid_permutation(&self) -> bool {
        first_permutation_error(&self.nodes).is_none()
    }

    /// Recompute the length from scratch and compare it with the cached value.
    pub fn is_consistent<O: DistanceOracle>(&self, oracle: &O) -> bool {
        self.is_valid_permutation() && oracle.tour_length(&self.nodes) == self.length
    }

    /// Bring the cached length in line with the node order.
    pub fn recompute_length<O: DistanceOracle>(&mut self, oracle: &O) {
        self.length = oracle.tour_length(&self.nodes);
    }
}

fn first_permutation_error(nodes: &[NodeId]) -> Option<String> {
    let n = nodes.len();
    let mut seen = vec![false; n + 1];

    for &node in nodes {
        if node == 0 || node > n {
            return Some(format!("city {} outside 1..={}", node, n));
        }
        if seen[node] {
            return Some(format!("city {} visited twice", node));
        }
        seen[node] = true;
    }

    None
}

impl fmt::Debug for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tour:")?;
        writeln!(f, "  Length: {}", self.length)?;
        writeln!(f, "  Cities: {}", self.nodes.len())?;
        writeln!(f, "  Order: {:?}", self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Evaluator;
    use crate::problem::{Metric, Problem};

    fn square() -> Problem {
        Problem::from_coordinates(
            "square".into(),
            vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)],
            Metric::Euclidean,
        )
    }

    #[test]
    fn new_rejects_duplicates_and_gaps() {
        let problem = square();
        let oracle = Evaluator::unlimited(&problem, 0);
        assert!(Tour::new(vec![1, 2, 2, 4], &oracle).is_err());
        assert!(Tour::new(vec![1, 2, 3, 5], &oracle).is_err());
        assert!(Tour::new(vec![1, 2, 3], &oracle).is_err());
        let tour = Tour::new(vec![1, 2, 3, 4], &oracle).unwrap();
        assert_eq!(tour.length, 40);
    }

    #[test]
    fn random_tour_is_a_permutation() {
        let problem = square();
        let mut oracle = Evaluator::unlimited(&problem, 7);
        let tour = Tour::random(&mut oracle);
        assert!(tour.is_consistent(&oracle));
    }
}
