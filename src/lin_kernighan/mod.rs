//! Lin-Kernighan local search over an edge-set representation.
//!
//! Starting from a root city `t1`, the engine grows an alternating chain of
//! removed edges `x_q = (t_{2q-1}, t_{2q})` and added edges
//! `y_q = (t_{2q}, t_{2q+1})` on a working copy of the tour's edges, keeping
//! the running gain positive. From depth two on, closing the chain with
//! `(t_{2q}, t1)` is tried; when that yields a single cycle shorter than the
//! current tour, it is committed and the search restarts from the same root.
//!
//! Dead ends are resolved with the table in [`chain::Rewind`]. Every choice
//! made at a depth is recorded in its [`chain::Frame`], so rewinding undoes
//! exactly the edges that depth changed.
//!
//! Two variants share the machinery:
//!
//! * [`Variant::Full`] considers every city as `t_{2q+1}`, nearest first,
//!   and visits roots in order;
//! * [`Variant::CandidateList`] samples `t_{2q+1}` from the shuffled `m`
//!   nearest neighbors of `t_{2q}`, and shuffles roots and removal choices.

pub mod chain;

use log::{debug, trace, warn};
use rand::seq::SliceRandom;

use crate::candidates::CandidateLists;
use crate::config::{Algorithm, Config};
use crate::edge_set::EdgeSet;
use crate::oracle::DistanceOracle;
use crate::problem::NodeId;
use crate::tour::Tour;
use crate::Outcome;

use self::chain::{edge, Exhausted, Frame, Rewind};

/// How additions are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Full,
    CandidateList,
}

/// Counters collected over the lifetime of an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LkStats {
    pub roots: u64,
    pub closures: u64,
    pub commits: u64,
    pub deepest: usize,
    /// Rewinds to: next `y_2`, next `x_2`, next `y_1`, next `x_1`
    pub backtracks: [u64; 4],
}

/// Result of one attempt from a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Committed,
    Exhausted,
    Terminated,
}

/// Lin-Kernighan engine.
pub struct LinKernighan {
    variant: Variant,
    candidate_list_size: usize,
    neighbors: Option<CandidateLists>,
    /// Edges of the last committed tour
    committed: EdgeSet,
    /// Edges of the chain under construction
    working: EdgeSet,
    frames: Vec<Frame>,
    depth: usize,
    path: Vec<NodeId>,
    stats: LkStats,
}

impl LinKernighan {
    pub fn new(variant: Variant, candidate_list_size: usize) -> Self {
        LinKernighan {
            variant,
            candidate_list_size: candidate_list_size.max(1),
            neighbors: None,
            committed: EdgeSet::new(0),
            working: EdgeSet::new(0),
            frames: Vec::new(),
            depth: 0,
            path: Vec::new(),
            stats: LkStats::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let variant = match config.algorithm {
            Algorithm::LinKernighanCandidates => Variant::CandidateList,
            _ => Variant::Full,
        };
        LinKernighan::new(variant, config.candidate_list_size)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn stats(&self) -> &LkStats {
        &self.stats
    }

    /// Improve `tour` until a full pass over all roots commits nothing or the
    /// oracle asks to stop. On termination the tour is the last committed
    /// one; the chain under construction is discarded.
    pub fn local_search<O: DistanceOracle>(&mut self, tour: &mut Tour, oracle: &mut O) -> Outcome {
        oracle.register_evaluation(&tour.nodes, tour.length);
        let n = tour.len();
        if n < 4 {
            return Outcome::LocalOptimum;
        }
        debug!(
            "LK start ({:?}): n = {}, length = {}",
            self.variant, n, tour.length
        );

        self.prepare(tour, oracle);
        let mut roots: Vec<NodeId> = (1..=n).collect();
        let mut passes = 0;

        loop {
            passes += 1;
            if self.variant == Variant::CandidateList {
                roots.shuffle(oracle.rng());
            }

            let mut improved = false;
            for &t1 in &roots {
                loop {
                    match self.attempt(t1, tour, oracle) {
                        Attempt::Committed => improved = true,
                        Attempt::Exhausted => break,
                        Attempt::Terminated => {
                            warn!("budget exhausted during LK pass {}", passes);
                            return Outcome::Terminated;
                        }
                    }
                }
            }

            if !improved {
                debug!(
                    "LK local optimum after {} passes: length = {}, commits = {}",
                    passes, tour.length, self.stats.commits
                );
                return Outcome::LocalOptimum;
            }
        }
    }

    fn prepare<O: DistanceOracle>(&mut self, tour: &Tour, oracle: &O) {
        let n = tour.len();
        let size = match self.variant {
            Variant::Full => n - 1,
            Variant::CandidateList => self.candidate_list_size,
        };
        self.neighbors = Some(CandidateLists::nearest(oracle, size));

        self.committed = EdgeSet::new(n);
        self.committed.from_path_representation(&tour.nodes);
        self.working = EdgeSet::new(n);
        self.depth = 0;
    }

    /// Grow chains from `t1` until one is committed or every alternative the
    /// rewind table allows has failed.
    fn attempt<O: DistanceOracle>(&mut self, t1: NodeId, tour: &mut Tour, oracle: &mut O) -> Attempt {
        self.stats.roots += 1;
        self.working.copy_from(&self.committed);
        self.depth = 0;
        self.push_frame(t1, 0, oracle);

        loop {
            if oracle.should_terminate() {
                self.depth = 0;
                return Attempt::Terminated;
            }

            let q = self.depth;
            let exhausted = if self.frames[q - 1].broken.is_none() {
                if self.break_next_x(t1, oracle) {
                    if q >= 2 && self.try_close(t1, tour, oracle) {
                        return Attempt::Committed;
                    }
                    self.prepare_additions(oracle);
                    continue;
                }
                Exhausted::X
            } else {
                match self.add_next_y(t1, oracle) {
                    Some((next, gain)) => {
                        self.push_frame(next, gain, oracle);
                        continue;
                    }
                    None => Exhausted::Y,
                }
            };

            match Rewind::after(q, exhausted) {
                Some(rewind) => {
                    self.stats.backtracks[rewind.index()] += 1;
                    self.rewind(rewind);
                }
                None => {
                    self.depth = 0;
                    return Attempt::Exhausted;
                }
            }
        }
    }

    /// Open depth `self.depth + 1` at `from` with the gain so far.
    fn push_frame<O: DistanceOracle>(&mut self, from: NodeId, gain: i64, oracle: &mut O) {
        self.depth += 1;
        self.stats.deepest = self.stats.deepest.max(self.depth);
        if self.frames.len() < self.depth {
            self.frames.push(Frame::default());
        }

        let d = self.depth - 1;
        self.frames[d].reset(from, gain);
        let mut xs = std::mem::take(&mut self.frames[d].x_candidates);
        self.working.get_edges(from, &mut xs);
        xs.retain(|&t| !self.is_added(from, t));
        if self.variant == Variant::CandidateList {
            xs.shuffle(oracle.rng());
        }
        self.frames[d].x_candidates = xs;
    }

    /// Remove the next acceptable `x_q`. Returns `false` when none is left.
    fn break_next_x<O: DistanceOracle>(&mut self, t1: NodeId, oracle: &O) -> bool {
        let d = self.depth - 1;
        let from = self.frames[d].from;
        loop {
            let frame = &mut self.frames[d];
            let Some(&t) = frame.x_candidates.get(frame.x_cursor) else {
                return false;
            };
            frame.x_cursor += 1;

            if t == t1 || !self.working.has_edge(from, t) || self.is_added(from, t) {
                continue;
            }

            self.working.delete_edge_if_exists(from, t);
            let frame = &mut self.frames[d];
            frame.broken = Some(t);
            frame.gain_broken = frame.gain + oracle.distance(from, t);
            return true;
        }
    }

    /// Close the chain with `(t_{2q}, t1)` and commit it if it forms a
    /// shorter tour.
    fn try_close<O: DistanceOracle>(&mut self, t1: NodeId, tour: &mut Tour, oracle: &mut O) -> bool {
        let frame = &self.frames[self.depth - 1];
        let Some(last) = frame.broken else {
            return false;
        };
        let gain = frame.gain_broken - oracle.distance(last, t1);
        if gain <= 0 || last == t1 || self.working.has_edge(last, t1) {
            return false;
        }

        self.stats.closures += 1;
        self.working.add_edge(last, t1);
        if !self.working.to_path_representation(&mut self.path) {
            self.working.delete_edge_if_exists(last, t1);
            return false;
        }

        tour.nodes.copy_from_slice(&self.path);
        tour.length -= gain;
        debug_assert!(tour.is_consistent(&*oracle));
        oracle.register_evaluation(&tour.nodes, tour.length);
        self.committed.copy_from(&self.working);
        self.stats.commits += 1;
        trace!(
            "LK commit from {} at depth {}: gain {} -> length {}",
            t1,
            self.depth,
            gain,
            tour.length
        );
        self.depth = 0;
        true
    }

    /// Fill the addition candidates of the deepest frame.
    fn prepare_additions<O: DistanceOracle>(&mut self, oracle: &mut O) {
        let d = self.depth - 1;
        let Some(last) = self.frames[d].broken else {
            return;
        };
        let Some(neighbors) = self.neighbors.as_ref() else {
            return;
        };

        let frame = &mut self.frames[d];
        frame.y_candidates.clear();
        frame.y_candidates.extend_from_slice(neighbors.of(last));
        frame.y_cursor = 0;
        if self.variant == Variant::CandidateList {
            frame.y_candidates.shuffle(oracle.rng());
        }
    }

    /// Add the next acceptable `y_q`. Returns `t_{2q+1}` and the gain after
    /// the addition, or `None` when no candidate is left.
    fn add_next_y<O: DistanceOracle>(&mut self, t1: NodeId, oracle: &O) -> Option<(NodeId, i64)> {
        let d = self.depth - 1;
        let from = self.frames[d].from;
        let last = self.frames[d].broken?;
        let gain_broken = self.frames[d].gain_broken;

        loop {
            let frame = &mut self.frames[d];
            let &t = frame.y_candidates.get(frame.y_cursor)?;
            frame.y_cursor += 1;

            let gain = gain_broken - oracle.distance(last, t);
            if gain <= 0 {
                if self.variant == Variant::Full {
                    // Candidates are sorted by distance; no later one qualifies
                    frame.y_cursor = frame.y_candidates.len();
                    return None;
                }
                continue;
            }
            if t == last
                || t == t1
                || t == from
                || self.working.degree(t) != 2
                || self.working.has_edge(last, t)
                || self.is_deleted(last, t)
            {
                continue;
            }

            self.working.add_edge(last, t);
            self.frames[d].added = Some(t);
            return Some((t, gain));
        }
    }

    /// Pop frames down to the rewind depth and undo the choice to retry.
    fn rewind(&mut self, rewind: Rewind) {
        let target = rewind.depth();
        while self.depth > target {
            self.undo_addition(self.depth - 1);
            self.undo_removal(self.depth - 1);
            self.depth -= 1;
        }

        self.undo_addition(target - 1);
        if let Rewind::NextX { .. } = rewind {
            self.undo_removal(target - 1);
        }
    }

    fn undo_addition(&mut self, d: usize) {
        let frame = &mut self.frames[d];
        if let (Some(last), Some(t)) = (frame.broken, frame.added.take()) {
            self.working.delete_edge_if_exists(last, t);
        }
    }

    fn undo_removal(&mut self, d: usize) {
        let frame = &mut self.frames[d];
        debug_assert!(frame.added.is_none());
        if let Some(t) = frame.broken.take() {
            self.working.add_edge(frame.from, t);
            frame.gain_broken = frame.gain;
        }
    }

    /// Whether `(a, b)` was added by the current chain.
    fn is_added(&self, a: NodeId, b: NodeId) -> bool {
        let e = edge(a, b);
        self.frames[..self.depth]
            .iter()
            .any(|frame| frame.added_edge() == Some(e))
    }

    /// Whether `(a, b)` was removed by the current chain.
    fn is_deleted(&self, a: NodeId, b: NodeId) -> bool {
        let e = edge(a, b);
        self.frames[..self.depth]
            .iter()
            .any(|frame| frame.broken_edge() == Some(e))
    }
}
