//! Tests for the edge-set tour representation.

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tsp_moves::edge_set::EdgeSet;
use tsp_moves::problem::NodeId;

fn random_tour(n: usize, seed: u64) -> Vec<NodeId> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tour: Vec<NodeId> = (1..=n).collect();
    tour.shuffle(&mut rng);
    tour
}

/// The tour rotated to start at city 1, in either direction.
fn normalized(tour: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut forward = tour.to_vec();
    if let Some(pos) = forward.iter().position(|&c| c == 1) {
        forward.rotate_left(pos);
    }
    let mut backward = forward.clone();
    backward[1..].reverse();
    (forward, backward)
}

#[test]
fn test_two_opt_exchange_on_edges() {
    let mut edges = EdgeSet::new(6);
    edges.from_path_representation(&[1, 2, 3, 4, 5, 6]);

    // replace (2,3) and (5,6) by (2,5) and (3,6)
    assert!(edges.delete_edge_if_exists(2, 3));
    assert!(edges.delete_edge_if_exists(5, 6));
    edges.add_edge(2, 5);
    edges.add_edge(3, 6);

    let mut path = Vec::new();
    assert!(edges.to_path_representation(&mut path));
    let (forward, backward) = normalized(&[1, 2, 5, 4, 3, 6]);
    assert!(path == forward || path == backward);
}

#[test]
fn test_broken_exchange_is_rejected() {
    let mut edges = EdgeSet::new(6);
    edges.from_path_representation(&[1, 2, 3, 4, 5, 6]);

    // (2,6) and (3,5) closes two triangles
    edges.delete_edge_if_exists(2, 3);
    edges.delete_edge_if_exists(5, 6);
    edges.add_edge(2, 6);
    edges.add_edge(3, 5);

    let mut path = Vec::new();
    assert!(!edges.to_path_representation(&mut path));
}

#[test]
fn test_missing_edge_is_rejected() {
    let mut edges = EdgeSet::new(5);
    edges.from_path_representation(&[1, 2, 3, 4, 5]);
    edges.delete_edge_if_exists(3, 4);

    let mut path = Vec::new();
    assert!(!edges.to_path_representation(&mut path));
    assert_eq!(edges.degree(3), 1);
}

#[test]
fn test_neighbors_after_modification() {
    let mut edges = EdgeSet::new(5);
    edges.from_path_representation(&[1, 2, 3, 4, 5]);
    edges.delete_edge_if_exists(1, 5);
    edges.add_edge(1, 4);

    let mut neighbors: Vec<NodeId> = edges.neighbors(1).collect();
    neighbors.sort_unstable();
    assert_eq!(neighbors, vec![2, 4]);
    assert_eq!(edges.degree(4), 3);
    assert_eq!(edges.edge_count(), 5);
}

proptest! {
    #[test]
    fn prop_path_round_trip(n in 3usize..60, seed in any::<u64>()) {
        let tour = random_tour(n, seed);
        let mut edges = EdgeSet::new(n);
        edges.from_path_representation(&tour);

        let mut path = Vec::new();
        prop_assert!(edges.to_path_representation(&mut path));
        prop_assert_eq!(path[0], 1);

        let (forward, backward) = normalized(&tour);
        prop_assert!(path == forward || path == backward);
    }

    #[test]
    fn prop_add_then_delete_is_identity(
        n in 5usize..40,
        seed in any::<u64>(),
        a in 0usize..1000,
        offset in 2usize..1000,
    ) {
        let tour = random_tour(n, seed);
        let mut edges = EdgeSet::new(n);
        edges.from_path_representation(&tour);

        // positions at least two apart are never tour neighbors
        let pa = a % n;
        let pb = (pa + 2 + offset % (n - 3)) % n;
        let (x, y) = (tour[pa], tour[pb]);
        prop_assume!(!edges.has_edge(x, y));

        edges.add_edge(x, y);
        prop_assert!(edges.has_edge(y, x));
        prop_assert!(edges.delete_edge_if_exists(x, y));
        prop_assert!(!edges.has_edge(x, y));
        prop_assert_eq!(edges.edge_count(), n);
    }

    #[test]
    fn prop_copy_is_independent(n in 4usize..30, seed in any::<u64>()) {
        let tour = random_tour(n, seed);
        let mut original = EdgeSet::new(n);
        original.from_path_representation(&tour);

        let mut copy = EdgeSet::new(n);
        copy.copy_from(&original);
        copy.delete_edge_if_exists(tour[0], tour[1]);

        prop_assert!(original.has_edge(tour[0], tour[1]));
        prop_assert!(!copy.has_edge(tour[0], tour[1]));
        prop_assert_eq!(original.edge_count(), n);
    }
}
