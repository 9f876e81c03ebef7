//! Local reconnection moves over a tour array.
//!
//! A move is keyed by an index pair `(i, j)` with `i < j` and touches the
//! positions `i - 1 ..= j + 1` (cyclically). With `im1 = i - 1` and
//! `jp1 = j + 1`:
//!
//! ```text
//! Reverse      t[i..=j] reversed
//! RotateLeft   t[i] moves behind t[j], t[i+1..=j] shift left
//! RotateRight  t[j] moves in front of t[i], t[i..j] shift right
//! Swap         t[i] and t[j] exchange places
//! ```
//!
//! A pending [`Move`] carries its delta and the new edge lengths needed to
//! patch the per-position distance array. Applying it consumes the move and
//! yields an [`AppliedMove`], which only knows which positions it disturbed.

use std::cmp::Ordering;

use crate::config::MoveOrder;
use crate::oracle::DistanceOracle;
use crate::problem::NodeId;

/// The four reconnection operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Reverse,
    RotateLeft,
    RotateRight,
    Swap,
}

impl MoveKind {
    pub const ALL: [MoveKind; 4] = [
        MoveKind::Reverse,
        MoveKind::RotateLeft,
        MoveKind::RotateRight,
        MoveKind::Swap,
    ];

    /// Smallest `j - i` for which the operator is distinct from the others.
    fn min_span(self) -> usize {
        match self {
            MoveKind::Reverse => 1,
            _ => 2,
        }
    }

    /// Number of new edges the operator creates.
    fn new_edges(self) -> usize {
        match self {
            MoveKind::Reverse => 2,
            MoveKind::RotateLeft | MoveKind::RotateRight => 3,
            MoveKind::Swap => 4,
        }
    }

    fn rank(self) -> u8 {
        match self {
            MoveKind::Reverse => 0,
            MoveKind::RotateLeft => 1,
            MoveKind::RotateRight => 2,
            MoveKind::Swap => 3,
        }
    }

    /// Whether `(i, j)` is a valid index pair for this operator on `n` cities.
    ///
    /// The positions `i - 1 ..= j + 1` must be pairwise distinct.
    #[inline]
    pub fn fits(self, i: usize, j: usize, n: usize) -> bool {
        i < j && j < n && j - i >= self.min_span() && j - i + 3 <= n
    }

    /// Kind after the segment containing the move has been reversed.
    fn mirrored(self) -> MoveKind {
        match self {
            MoveKind::RotateLeft => MoveKind::RotateRight,
            MoveKind::RotateRight => MoveKind::RotateLeft,
            other => other,
        }
    }
}

/// A pending move with its length change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub i: usize,
    pub j: usize,
    /// Signed tour length change; negative improves
    pub delta: i64,
    /// Lengths of the new edges, in the order they patch the distance array
    patch: [i64; 4],
}

impl Move {
    /// Evaluate `kind` at `(i, j)` on the current tour.
    ///
    /// `dist[k]` must hold the length of the edge from position `k` to `k + 1`.
    pub fn evaluate<O: DistanceOracle>(
        kind: MoveKind,
        i: usize,
        j: usize,
        tour: &[NodeId],
        dist: &[i64],
        oracle: &O,
    ) -> Move {
        let n = tour.len();
        debug_assert!(kind.fits(i, j, n));
        let im1 = (i + n - 1) % n;
        let jp1 = (j + 1) % n;
        let d = |a: usize, b: usize| oracle.distance(tour[a], tour[b]);

        let (patch, removed) = match kind {
            MoveKind::Reverse => ([d(im1, j), d(i, jp1), 0, 0], dist[im1] + dist[j]),
            MoveKind::RotateLeft => (
                [d(im1, i + 1), d(j, i), d(i, jp1), 0],
                dist[im1] + dist[i] + dist[j],
            ),
            MoveKind::RotateRight => (
                [d(im1, j), d(j, i), d(j - 1, jp1), 0],
                dist[im1] + dist[j - 1] + dist[j],
            ),
            MoveKind::Swap => (
                [d(im1, j), d(j, i + 1), d(j - 1, i), d(i, jp1)],
                dist[im1] + dist[i] + dist[j - 1] + dist[j],
            ),
        };

        Move {
            kind,
            i,
            j,
            delta: patch.iter().sum::<i64>() - removed,
            patch,
        }
    }

    /// Positions whose cities determine this move's delta.
    pub fn relevant(&self, n: usize) -> impl Iterator<Item = usize> {
        let im1 = (self.i + n - 1) % n;
        let jp1 = (self.j + 1) % n;
        let inner = match self.kind {
            MoveKind::Reverse => None,
            _ => Some([self.i + 1, self.j - 1]),
        };
        [im1, self.i, self.j, jp1]
            .into_iter()
            .chain(inner.into_iter().flatten())
    }

    /// Perform the move on `tour` and patch `dist` at the touched positions.
    pub fn apply(self, tour: &mut [NodeId], dist: &mut [i64]) -> AppliedMove {
        let n = tour.len();
        let (i, j) = (self.i, self.j);
        let im1 = (i + n - 1) % n;
        let p = self.patch;

        match self.kind {
            MoveKind::Reverse => {
                tour[i..=j].reverse();
                dist[i..j].reverse();
                dist[im1] = p[0];
                dist[j] = p[1];
            }
            MoveKind::RotateLeft => {
                tour[i..=j].rotate_left(1);
                dist[i..j].rotate_left(1);
                dist[im1] = p[0];
                dist[j - 1] = p[1];
                dist[j] = p[2];
            }
            MoveKind::RotateRight => {
                tour[i..=j].rotate_right(1);
                dist[i..j].rotate_right(1);
                dist[im1] = p[0];
                dist[i] = p[1];
                dist[j] = p[2];
            }
            MoveKind::Swap => {
                tour.swap(i, j);
                dist[im1] = p[0];
                dist[i] = p[1];
                dist[j - 1] = p[2];
                dist[j] = p[3];
            }
        }

        AppliedMove::new(self.kind, i, j, n)
    }

    /// Queue ordering under the given policy. Ties fall back to the indices.
    pub fn compare(&self, other: &Move, order: MoveOrder) -> Ordering {
        let by_delta = self.delta.cmp(&other.delta);
        let by_kind = self.kind.rank().cmp(&other.kind.rank());
        let primary = match order {
            MoveOrder::BestDelta => by_delta.then(by_kind),
            MoveOrder::TypeThenDelta => by_kind.then(by_delta),
        };
        primary
            .then(self.i.cmp(&other.i))
            .then(self.j.cmp(&other.j))
    }
}

/// What happened to a pending move after another move was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// None of its positions changed
    Unaffected,
    /// It moved along with the segment and was rewritten in place
    Relocated,
    /// Its delta can no longer be trusted
    Invalidated,
}

/// A move after it was performed: the forbidden positions and the window it
/// rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub kind: MoveKind,
    pub i: usize,
    pub j: usize,
    n: usize,
    forbidden: [Option<usize>; 4],
}

impl AppliedMove {
    fn new(kind: MoveKind, i: usize, j: usize, n: usize) -> Self {
        let im1 = (i + n - 1) % n;
        let jp1 = (j + 1) % n;
        let extra = match kind {
            MoveKind::Reverse => [None, None],
            MoveKind::RotateLeft => [Some(i), None],
            MoveKind::RotateRight => [Some(j), None],
            MoveKind::Swap => [Some(i), Some(j)],
        };
        AppliedMove {
            kind,
            i,
            j,
            n,
            forbidden: [Some(im1), Some(jp1), extra[0], extra[1]],
        }
    }

    /// Positions a surviving move must not depend on.
    pub fn forbidden(&self) -> impl Iterator<Item = usize> + '_ {
        self.forbidden.iter().filter_map(|&p| p)
    }

    /// Smallest and largest position whose edges may have changed.
    pub fn touched(&self) -> (usize, usize) {
        let n = self.n;
        if self.i == 0 || self.j == n - 1 {
            (0, n - 1)
        } else {
            (self.i - 1, self.j + 1)
        }
    }

    /// Decide the fate of `other` and rewrite it if it moved with the segment.
    pub fn affect(&self, other: &mut Move) -> Fate {
        let n = self.n;
        if other
            .relevant(n)
            .any(|p| self.forbidden.contains(&Some(p)))
        {
            return Fate::Invalidated;
        }

        let shift: isize = match self.kind {
            MoveKind::Swap => return Fate::Unaffected,
            MoveKind::Reverse => 0,
            MoveKind::RotateLeft => -1,
            MoveKind::RotateRight => 1,
        };

        let total = other.relevant(n).count();
        let inside = other
            .relevant(n)
            .filter(|&p| self.i <= p && p <= self.j)
            .count();

        if inside == 0 {
            return Fate::Unaffected;
        }
        if inside < total {
            return Fate::Invalidated;
        }

        if self.kind == MoveKind::Reverse {
            let (i, j) = (self.i + self.j - other.j, self.i + self.j - other.i);
            let used = other.kind.new_edges();
            other.patch[..used].reverse();
            other.kind = other.kind.mirrored();
            other.i = i;
            other.j = j;
        } else {
            other.i = other.i.wrapping_add_signed(shift);
            other.j = other.j.wrapping_add_signed(shift);
        }

        Fate::Relocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Evaluator;
    use crate::problem::Problem;

    fn pentagon() -> Problem {
        let mut m = vec![vec![100; 5]; 5];
        for (a, b, d) in [
            (1, 2, 2),
            (2, 3, 2),
            (3, 4, 2),
            (4, 5, 2),
            (5, 1, 2),
            (1, 3, 1),
            (2, 4, 1),
        ] {
            m[a - 1][b - 1] = d;
            m[b - 1][a - 1] = d;
        }
        for (k, row) in m.iter_mut().enumerate() {
            row[k] = 0;
        }
        Problem::from_matrix("pentagon".into(), m).unwrap()
    }

    fn dist_of<O: DistanceOracle>(tour: &[NodeId], oracle: &O) -> Vec<i64> {
        let n = tour.len();
        (0..n)
            .map(|k| oracle.distance(tour[k], tour[(k + 1) % n]))
            .collect()
    }

    #[test]
    fn fits_requires_distinct_boundaries() {
        assert!(MoveKind::Reverse.fits(1, 2, 5));
        assert!(!MoveKind::Swap.fits(1, 2, 5));
        assert!(MoveKind::Swap.fits(1, 3, 5));
        assert!(!MoveKind::Reverse.fits(0, 3, 5));
        assert!(!MoveKind::Reverse.fits(2, 2, 5));
    }

    #[test]
    fn reverse_scenario() {
        let problem = pentagon();
        let oracle = Evaluator::unlimited(&problem, 0);
        let mut tour = vec![1, 2, 3, 4, 5];
        let mut dist = dist_of(&tour, &oracle);

        let mv = Move::evaluate(MoveKind::Reverse, 1, 2, &tour, &dist, &oracle);
        assert_eq!(mv.delta, -2);

        let before = oracle.tour_length(&tour);
        mv.apply(&mut tour, &mut dist);
        assert_eq!(tour, vec![1, 3, 2, 4, 5]);
        assert_eq!(oracle.tour_length(&tour), before - 2);
        assert_eq!(dist, dist_of(&tour, &oracle));
    }

    #[test]
    fn forbidden_sets_by_kind() {
        let reverse = AppliedMove::new(MoveKind::Reverse, 3, 6, 10);
        assert_eq!(reverse.forbidden().collect::<Vec<_>>(), vec![2, 7]);
        let left = AppliedMove::new(MoveKind::RotateLeft, 3, 6, 10);
        assert_eq!(left.forbidden().collect::<Vec<_>>(), vec![2, 7, 3]);
        let swap = AppliedMove::new(MoveKind::Swap, 0, 6, 10);
        assert_eq!(swap.forbidden().collect::<Vec<_>>(), vec![9, 7, 0, 6]);
        assert_eq!(swap.touched(), (0, 9));
    }

    #[test]
    fn reversal_mirrors_inner_rotation() {
        let applied = AppliedMove::new(MoveKind::Reverse, 2, 12, 20);
        let mut inner = Move {
            kind: MoveKind::RotateLeft,
            i: 4,
            j: 7,
            delta: -3,
            patch: [1, 2, 3, 0],
        };
        assert_eq!(applied.affect(&mut inner), Fate::Relocated);
        assert_eq!(inner.kind, MoveKind::RotateRight);
        assert_eq!((inner.i, inner.j), (7, 10));
        assert_eq!(inner.patch, [3, 2, 1, 0]);
        assert_eq!(inner.delta, -3);
    }

    #[test]
    fn straddling_move_is_invalidated() {
        let applied = AppliedMove::new(MoveKind::Reverse, 5, 10, 20);
        let mut straddle = Move {
            kind: MoveKind::Reverse,
            i: 2,
            j: 8,
            delta: -1,
            patch: [0; 4],
        };
        assert_eq!(applied.affect(&mut straddle), Fate::Invalidated);

        let mut far = Move {
            kind: MoveKind::Swap,
            i: 13,
            j: 16,
            delta: -1,
            patch: [0; 4],
        };
        assert_eq!(applied.affect(&mut far), Fate::Unaffected);
    }
}
