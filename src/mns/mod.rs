//! Multi-Neighborhood Search with an incrementally maintained move queue.
//!
//! The engine alternates between two phases:
//!
//! * **fill**: evaluate all four operators on every index pair whose span
//!   meets the current range and queue the improving ones best first;
//! * **drain**: pop the best move, apply it, then walk the rest of the queue
//!   once, dropping moves that depend on disturbed positions and rewriting
//!   those that moved along with the rearranged segment.
//!
//! After a drain only the positions touched since the last full fill are
//! refilled. A full fill that finds nothing ends the search.

pub mod moves;
pub mod queue;

use log::{debug, trace, warn};

use crate::config::{Config, MoveOrder};
use crate::oracle::DistanceOracle;
use crate::tour::Tour;
use crate::window::WindowOptimizer;
use crate::Outcome;

use self::moves::{Fate, Move, MoveKind};
use self::queue::MoveQueue;

/// Inclusive range of tour positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub lo: usize,
    pub hi: usize,
}

impl IndexRange {
    pub fn full(n: usize) -> Self {
        IndexRange { lo: 0, hi: n - 1 }
    }

    pub fn union(self, other: IndexRange) -> Self {
        IndexRange {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    pub fn is_full(&self, n: usize) -> bool {
        self.lo == 0 && self.hi + 1 >= n
    }

    #[inline]
    fn contains(&self, p: usize) -> bool {
        self.lo <= p && p <= self.hi
    }

    /// Whether any position of the span `i - 1 ..= j + 1` lies in the range.
    #[inline]
    fn meets_span(&self, i: usize, j: usize, n: usize) -> bool {
        let im1 = (i + n - 1) % n;
        let jp1 = (j + 1) % n;
        (i <= self.hi && j >= self.lo) || self.contains(im1) || self.contains(jp1)
    }
}

/// Outcome of a fill phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    Complete,
    /// The pool ran out; candidates were skipped
    Incomplete,
    Terminated,
}

/// Counters collected over the lifetime of an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MnsStats {
    pub fills: u64,
    pub full_fills: u64,
    pub pool_exhaustions: u64,
    pub applied: u64,
    pub invalidated: u64,
    pub relocated: u64,
}

/// Multi-Neighborhood Search engine.
pub struct Mns {
    queue: MoveQueue,
    window: Option<WindowOptimizer>,
    /// `dist[k]` is the length of the edge leaving position `k`
    dist: Vec<i64>,
    stats: MnsStats,
}

impl Mns {
    /// Create an engine with the given queue policy and pool capacity.
    pub fn new(order: MoveOrder, max_moves: usize) -> Self {
        Mns {
            queue: MoveQueue::new(order, max_moves.max(1)),
            window: None,
            dist: Vec::new(),
            stats: MnsStats::default(),
        }
    }

    /// Create an engine from a configuration, including the companion window
    /// optimizer when one is configured.
    pub fn from_config(config: &Config) -> Self {
        let mut mns = Mns::new(config.move_order, config.max_moves);
        if let Some(w) = config.window_size {
            mns = mns.with_window(WindowOptimizer::new(w, config.random_overlap));
        }
        mns
    }

    /// Couple the engine with a window optimizer.
    pub fn with_window(mut self, window: WindowOptimizer) -> Self {
        self.window = Some(window);
        self
    }

    pub fn stats(&self) -> &MnsStats {
        &self.stats
    }

    /// Per-position edge lengths as left by the last search.
    pub fn distance_array(&self) -> &[i64] {
        &self.dist
    }

    /// Improve `tour` until no queued operator improves it or the oracle
    /// asks to stop. The tour is a valid permutation with an exact cached
    /// length whenever this returns.
    pub fn local_search<O: DistanceOracle>(&mut self, tour: &mut Tour, oracle: &mut O) -> Outcome {
        oracle.register_evaluation(&tour.nodes, tour.length);
        debug!("MNS start: n = {}, length = {}", tour.len(), tour.length);

        loop {
            let covered = match self.window.as_mut() {
                Some(window) => {
                    if window.converge(tour, oracle) == Outcome::Terminated {
                        warn!("budget exhausted during window optimization");
                        return Outcome::Terminated;
                    }
                    window.effective_size(tour.len())
                }
                None => 0,
            };

            let applied = match self.descend(tour, oracle, covered) {
                Some(applied) => applied,
                None => {
                    warn!("budget exhausted before MNS reached a local optimum");
                    return Outcome::Terminated;
                }
            };

            if self.window.is_none() || applied == 0 {
                debug!(
                    "MNS local optimum: length = {}, applied = {}",
                    tour.length, self.stats.applied
                );
                return Outcome::LocalOptimum;
            }
        }
    }

    /// Fill and drain until a full fill comes back empty.
    ///
    /// Spans of at most `covered` positions are skipped on the first fill;
    /// the caller guarantees they cannot improve the tour as handed in.
    /// Returns the number of applied moves, or `None` when terminated.
    fn descend<O: DistanceOracle>(
        &mut self,
        tour: &mut Tour,
        oracle: &mut O,
        covered: usize,
    ) -> Option<u64> {
        let n = tour.len();
        if n < 4 {
            return Some(0);
        }

        self.rebuild_distances(tour, oracle);
        let mut range = IndexRange::full(n);
        let mut skip = covered;
        let mut applied = 0;

        loop {
            let full = range.is_full(n);
            let fill = self.fill_queue(tour, oracle, range, skip);
            if fill == Fill::Terminated {
                self.queue.clear();
                return None;
            }

            if self.queue.is_empty() {
                if full {
                    debug_assert_eq!(tour.length, self.dist.iter().sum::<i64>());
                    return Some(applied);
                }
                range = IndexRange::full(n);
                continue;
            }

            let touched = self.drain(tour, oracle, &mut applied)?;
            skip = 0;

            range = if fill == Fill::Incomplete {
                IndexRange::full(n)
            } else if full {
                touched
            } else {
                range.union(touched)
            };
        }
    }

    fn rebuild_distances<O: DistanceOracle>(&mut self, tour: &Tour, oracle: &O) {
        let n = tour.len();
        self.dist.clear();
        self.dist.extend(
            (0..n).map(|k| oracle.distance(tour.nodes[k], tour.nodes[(k + 1) % n])),
        );
    }

    /// Queue every improving move whose span meets `range`.
    fn fill_queue<O: DistanceOracle>(
        &mut self,
        tour: &Tour,
        oracle: &O,
        range: IndexRange,
        skip: usize,
    ) -> Fill {
        let n = tour.len();
        self.stats.fills += 1;
        if range.is_full(n) {
            self.stats.full_fills += 1;
        }

        let mut result = Fill::Complete;
        'pairs: for i in 0..n {
            if oracle.should_terminate() {
                result = Fill::Terminated;
                break;
            }
            let last = (n - 1).min(i + n - 3);
            for j in (i + 1)..=last {
                if j - i + 3 <= skip || !range.meets_span(i, j, n) {
                    continue;
                }
                for kind in MoveKind::ALL {
                    if !kind.fits(i, j, n) {
                        continue;
                    }
                    let mv = Move::evaluate(kind, i, j, &tour.nodes, &self.dist, oracle);
                    if mv.delta < 0 && !self.queue.insert(mv) {
                        self.stats.pool_exhaustions += 1;
                        result = Fill::Incomplete;
                        break 'pairs;
                    }
                }
            }
        }

        self.queue.link();
        debug!(
            "fill [{}, {}]: {} moves queued{}",
            range.lo,
            range.hi,
            self.queue.len(),
            if result == Fill::Incomplete {
                " (pool exhausted)"
            } else {
                ""
            }
        );
        result
    }

    /// Apply queued moves best first until the queue is empty.
    ///
    /// Returns the union of touched positions, or `None` when terminated.
    fn drain<O: DistanceOracle>(
        &mut self,
        tour: &mut Tour,
        oracle: &mut O,
        applied: &mut u64,
    ) -> Option<IndexRange> {
        let mut touched: Option<IndexRange> = None;

        while let Some(mv) = self.queue.pop_front() {
            let delta = mv.delta;
            let done = mv.apply(&mut tour.nodes, &mut self.dist);
            tour.length += delta;
            oracle.register_evaluation(&tour.nodes, tour.length);
            *applied += 1;
            self.stats.applied += 1;
            trace!(
                "{:?}({}, {}) delta {} -> length {}",
                done.kind,
                done.i,
                done.j,
                delta,
                tour.length
            );

            let (lo, hi) = done.touched();
            let window = IndexRange { lo, hi };
            touched = Some(touched.map_or(window, |t| t.union(window)));

            if oracle.should_terminate() {
                self.queue.clear();
                return None;
            }

            let stats = &mut self.stats;
            self.queue.retain_mut(|other| match done.affect(other) {
                Fate::Unaffected => true,
                Fate::Relocated => {
                    stats.relocated += 1;
                    true
                }
                Fate::Invalidated => {
                    stats.invalidated += 1;
                    false
                }
            });
        }

        Some(touched.unwrap_or_else(|| IndexRange::full(tour.len())))
    }
}
