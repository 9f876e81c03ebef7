//! Integration tests for the Multi-Neighborhood Search engine.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tsp_moves::config::{Config, MoveOrder};
use tsp_moves::mns::moves::{Move, MoveKind};
use tsp_moves::mns::Mns;
use tsp_moves::oracle::{Budget, DistanceOracle, Evaluator};
use tsp_moves::problem::{Metric, NodeId, Problem};
use tsp_moves::tour::Tour;
use tsp_moves::window::WindowOptimizer;
use tsp_moves::Outcome;

/// Creates a random Euclidean problem.
fn create_random_problem(n: usize, seed: u64) -> Problem {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let coordinates = (0..n)
        .map(|_| (rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)))
        .collect();
    Problem::from_coordinates(format!("random{}", n), coordinates, Metric::Euclidean)
}

/// Creates a problem with cities evenly spaced on a circle.
fn create_circle_problem(n: usize) -> Problem {
    let coordinates = (0..n)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
            (1000.0 * angle.cos(), 1000.0 * angle.sin())
        })
        .collect();
    Problem::from_coordinates("circle".into(), coordinates, Metric::Euclidean)
}

/// Whether some operator still improves the tour.
fn has_improving_move<O: DistanceOracle>(tour: &[NodeId], oracle: &O) -> bool {
    let n = tour.len();
    let dist: Vec<i64> = (0..n)
        .map(|k| oracle.distance(tour[k], tour[(k + 1) % n]))
        .collect();
    (0..n).any(|i| {
        ((i + 1)..n).any(|j| {
            MoveKind::ALL.iter().any(|&kind| {
                kind.fits(i, j, n) && Move::evaluate(kind, i, j, tour, &dist, oracle).delta < 0
            })
        })
    })
}

/// Oracle that records every registered length.
struct Recorder<'a> {
    inner: Evaluator<'a>,
    lengths: Vec<i64>,
}

impl DistanceOracle for Recorder<'_> {
    type Random = ChaCha8Rng;

    fn n(&self) -> usize {
        self.inner.n()
    }

    fn distance(&self, a: NodeId, b: NodeId) -> i64 {
        self.inner.distance(a, b)
    }

    fn should_terminate(&self) -> bool {
        self.inner.should_terminate()
    }

    fn register_evaluation(&mut self, nodes: &[NodeId], length: i64) {
        assert_eq!(self.inner.tour_length(nodes), length);
        self.lengths.push(length);
        self.inner.register_evaluation(nodes, length);
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        self.inner.rng()
    }
}

#[test]
fn test_reaches_local_optimum() {
    for seed in 0..5 {
        let problem = create_random_problem(40, seed);
        let mut oracle = Evaluator::unlimited(&problem, seed);
        let mut tour = Tour::random(&mut oracle);
        let before = tour.length;

        let mut mns = Mns::new(MoveOrder::BestDelta, 10_000);
        assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);

        assert!(tour.length < before);
        assert!(tour.is_consistent(&oracle));
        assert!(!has_improving_move(&tour.nodes, &oracle));
        let n = tour.len();
        let dist = mns.distance_array();
        assert_eq!(dist.len(), n);
        for k in 0..n {
            assert_eq!(
                dist[k],
                oracle.distance(tour.nodes[k], tour.nodes[(k + 1) % n])
            );
        }
        assert_eq!(dist.iter().sum::<i64>(), tour.length);
    }
}

#[test]
fn test_registered_lengths_decrease() {
    let problem = create_random_problem(30, 11);
    let inner = Evaluator::unlimited(&problem, 11);
    let mut oracle = Recorder {
        inner,
        lengths: Vec::new(),
    };
    let mut tour = Tour::random(&mut oracle);

    Mns::new(MoveOrder::BestDelta, 10_000).local_search(&mut tour, &mut oracle);

    assert!(oracle.lengths.len() > 1);
    for pair in oracle.lengths.windows(2) {
        assert!(pair[1] < pair[0]);
    }
    assert_eq!(*oracle.lengths.last().unwrap(), tour.length);
}

#[test]
fn test_optimal_tour_is_unchanged() {
    let problem = create_circle_problem(20);
    let mut oracle = Evaluator::unlimited(&problem, 0);
    let mut tour = Tour::identity(&oracle);
    let snapshot = tour.clone();

    let mut mns = Mns::new(MoveOrder::BestDelta, 10_000);
    assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);
    assert_eq!(tour, snapshot);
    assert_eq!(oracle.evaluations(), 1);
    assert_eq!(mns.stats().applied, 0);
}

#[test]
fn test_small_pool_still_converges() {
    let problem = create_random_problem(35, 5);
    let mut oracle = Evaluator::unlimited(&problem, 5);
    let mut tour = Tour::random(&mut oracle);

    let mut mns = Mns::new(MoveOrder::BestDelta, 3);
    assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);

    assert!(mns.stats().pool_exhaustions > 0);
    assert!(tour.is_consistent(&oracle));
    assert!(!has_improving_move(&tour.nodes, &oracle));
}

#[test]
fn test_type_then_delta_order() {
    let problem = create_random_problem(30, 8);
    let mut oracle = Evaluator::unlimited(&problem, 8);
    let mut tour = Tour::random(&mut oracle);

    let mut mns = Mns::new(MoveOrder::TypeThenDelta, 10_000);
    assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);
    assert!(tour.is_consistent(&oracle));
    assert!(!has_improving_move(&tour.nodes, &oracle));
}

#[test]
fn test_window_coupling() {
    for random_overlap in [false, true] {
        let problem = create_random_problem(25, 21);
        let mut oracle = Evaluator::unlimited(&problem, 21);
        let mut tour = Tour::random(&mut oracle);
        let before = tour.length;

        let config = Config::new()
            .with_window_size(5)
            .with_random_overlap(random_overlap);
        let mut mns = Mns::from_config(&config);
        assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);

        assert!(tour.length < before);
        assert!(tour.is_consistent(&oracle));
        assert!(!has_improving_move(&tour.nodes, &oracle));
    }
}

#[test]
fn test_window_larger_than_tour() {
    let problem = create_random_problem(6, 2);
    let mut oracle = Evaluator::unlimited(&problem, 2);
    let mut tour = Tour::random(&mut oracle);

    let mut mns = Mns::new(MoveOrder::BestDelta, 100).with_window(WindowOptimizer::new(8, false));
    assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);
    assert!(tour.is_consistent(&oracle));
    assert!(!has_improving_move(&tour.nodes, &oracle));
}

#[test]
fn test_budget_terminates() {
    let problem = create_random_problem(60, 3);
    let budget = Budget::unlimited().with_max_evaluations(5);
    let mut oracle = Evaluator::new(&problem, budget, 3);
    let mut tour = Tour::random(&mut oracle);
    let before = tour.length;

    let mut mns = Mns::new(MoveOrder::BestDelta, 10_000);
    assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::Terminated);

    assert!(oracle.should_terminate());
    assert_eq!(oracle.evaluations(), 5);
    assert!(tour.length < before);
    assert!(tour.is_consistent(&oracle));
}

#[test]
fn test_tiny_tours() {
    for n in 1..=4 {
        let problem = create_random_problem(n, 9);
        let mut oracle = Evaluator::unlimited(&problem, 9);
        let mut tour = Tour::random(&mut oracle);

        let mut mns = Mns::new(MoveOrder::BestDelta, 100);
        assert_eq!(mns.local_search(&mut tour, &mut oracle), Outcome::LocalOptimum);
        assert!(tour.is_consistent(&oracle));
    }
}
