//! Bounded-degree adjacency used by the Lin-Kernighan engine.
//!
//! During an exchange chain the working edge multiset is temporarily not a
//! tour: a node can hold up to [`MAX_DEGREE`] incident edges. Each node keeps
//! its neighbors in a small inline array so adding, removing and querying
//! an edge touch only two rows.

use crate::problem::NodeId;

/// Maximum number of incident edges a node may hold.
pub const MAX_DEGREE: usize = 4;

type Row = [Option<NodeId>; MAX_DEGREE];

/// Undirected edge multiset over the ids `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSet {
    /// Row 0 is unused so that ids index directly.
    rows: Vec<Row>,
}

impl EdgeSet {
    /// Create an empty edge set for `n` cities.
    pub fn new(n: usize) -> Self {
        EdgeSet {
            rows: vec![[None; MAX_DEGREE]; n + 1],
        }
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert the edge `{a, b}`.
    ///
    /// The caller guarantees that neither endpoint already holds
    /// [`MAX_DEGREE`] edges; this is only checked in debug builds.
    #[inline]
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        Self::insert(&mut self.rows[a], b);
        Self::insert(&mut self.rows[b], a);
    }

    #[inline]
    fn insert(row: &mut Row, node: NodeId) {
        let slot = row.iter_mut().find(|slot| slot.is_none());
        debug_assert!(slot.is_some(), "degree bound exceeded at neighbor {}", node);
        if let Some(slot) = slot {
            *slot = Some(node);
        }
    }

    /// Remove one copy of `{a, b}`, returning whether it was present.
    #[inline]
    pub fn delete_edge_if_exists(&mut self, a: NodeId, b: NodeId) -> bool {
        let Some(pos_a) = self.rows[a].iter().position(|&s| s == Some(b)) else {
            return false;
        };
        let Some(pos_b) = self.rows[b].iter().position(|&s| s == Some(a)) else {
            return false;
        };
        self.rows[a][pos_a] = None;
        self.rows[b][pos_b] = None;
        true
    }

    /// Whether `{a, b}` is present.
    #[inline]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.rows[a].contains(&Some(b))
    }

    /// Current neighbors of `node`.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.rows[node].iter().filter_map(|&slot| slot)
    }

    /// Collect the current neighbors of `node` into `out`, replacing its contents.
    pub fn get_edges(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.clear();
        out.extend(self.neighbors(node));
    }

    /// Number of edges incident to `node`.
    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        self.rows[node].iter().filter(|slot| slot.is_some()).count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        (1..self.rows.len()).map(|node| self.degree(node)).sum::<usize>() / 2
    }

    /// Load the edges of a tour given in visiting order.
    ///
    /// Each row holds the predecessor in slot 0 and the successor in slot 1.
    pub fn from_path_representation(&mut self, tour: &[NodeId]) {
        let n = tour.len();
        debug_assert_eq!(n, self.len());
        for i in 0..n {
            let prev = tour[(i + n - 1) % n];
            let next = tour[(i + 1) % n];
            self.rows[tour[i]] = [Some(prev), Some(next), None, None];
        }
    }

    /// Walk the edges starting at city 1 and write the visiting order into `dest`.
    ///
    /// Returns `true` only when every city has degree two and the walk closes
    /// a single cycle through all `n` cities. `dest` holds the partial walk
    /// otherwise.
    pub fn to_path_representation(&self, dest: &mut Vec<NodeId>) -> bool {
        let n = self.len();
        dest.clear();
        if n == 0 {
            return true;
        }

        let mut prev = 0;
        let mut current = 1;
        for _ in 0..n {
            let (a, b) = match self.rows[current] {
                [Some(a), Some(b), None, None] => (a, b),
                row => match Self::two_neighbors(&row) {
                    Some(pair) => pair,
                    None => return false,
                },
            };
            dest.push(current);
            let next = if a == prev { b } else { a };
            prev = current;
            current = next;
            if current == 1 {
                break;
            }
        }

        current == 1 && dest.len() == n
    }

    /// The two neighbors of a row holding exactly two edges in any slots.
    fn two_neighbors(row: &Row) -> Option<(NodeId, NodeId)> {
        let mut filled = row.iter().filter_map(|&slot| slot);
        let a = filled.next()?;
        let b = filled.next()?;
        match filled.next() {
            Some(_) => None,
            None => Some((a, b)),
        }
    }

    /// Overwrite this set with the contents of `other`.
    pub fn copy_from(&mut self, other: &EdgeSet) {
        self.rows.clear();
        self.rows.extend_from_slice(&other.rows);
    }

    /// Remove every edge.
    pub fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            *row = [None; MAX_DEGREE];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tour_round_trip() {
        let mut edges = EdgeSet::new(5);
        edges.from_path_representation(&[3, 1, 5, 2, 4]);
        assert_eq!(edges.edge_count(), 5);
        assert!(edges.has_edge(1, 3));
        assert!(edges.has_edge(4, 3));

        let mut path = Vec::new();
        assert!(edges.to_path_representation(&mut path));
        assert_eq!(path[0], 1);
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn two_subtours_are_not_a_tour() {
        let mut edges = EdgeSet::new(6);
        for &(a, b) in &[(1, 2), (2, 3), (3, 1), (4, 5), (5, 6), (6, 4)] {
            edges.add_edge(a, b);
        }
        let mut path = Vec::new();
        assert!(!edges.to_path_representation(&mut path));
    }

    #[test]
    fn degree_three_is_not_a_tour() {
        let mut edges = EdgeSet::new(4);
        edges.from_path_representation(&[1, 2, 3, 4]);
        edges.add_edge(1, 3);
        let mut path = Vec::new();
        assert!(!edges.to_path_representation(&mut path));
    }

    #[test]
    fn two_city_tour_uses_the_double_edge() {
        let mut edges = EdgeSet::new(2);
        edges.from_path_representation(&[2, 1]);
        let mut path = Vec::new();
        assert!(edges.to_path_representation(&mut path));
        assert_eq!(path, vec![1, 2]);
    }

    #[test]
    fn delete_reuses_any_slot() {
        let mut edges = EdgeSet::new(5);
        edges.from_path_representation(&[1, 2, 3, 4, 5]);
        assert!(edges.delete_edge_if_exists(1, 2));
        assert!(!edges.delete_edge_if_exists(1, 2));
        edges.add_edge(1, 3);
        assert_eq!(edges.degree(1), 2);
        assert_eq!(edges.degree(3), 3);

        let mut out = Vec::new();
        edges.get_edges(1, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![3, 5]);
    }

    #[test]
    fn copy_and_clear() {
        let mut a = EdgeSet::new(4);
        a.from_path_representation(&[1, 2, 3, 4]);
        let mut b = EdgeSet::new(4);
        b.copy_from(&a);
        assert_eq!(a, b);
        b.clear();
        assert_eq!(b.edge_count(), 0);
        assert_eq!(a.edge_count(), 4);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn degree_overflow_panics_in_debug() {
        let mut edges = EdgeSet::new(6);
        for other in 2..=6 {
            edges.add_edge(1, other);
        }
    }
}
