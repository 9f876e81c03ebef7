//! Exchange chain state: one frame per depth and the backtracking table.

use crate::problem::NodeId;

/// Normalized undirected edge.
pub type Edge = (NodeId, NodeId);

#[inline]
pub fn edge(a: NodeId, b: NodeId) -> Edge {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// State of one depth `q` of the chain.
///
/// At depth `q` the edge `x_q = (from, broken)` is removed from the working
/// set and the edge `y_q = (broken, added)` is put in its place. `from` is
/// `t_{2q-1}`, `broken` is `t_{2q}` and `added` is `t_{2q+1}`.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub from: NodeId,
    /// Gain accumulated before this depth
    pub gain: i64,
    /// Gain after removing `x_q`
    pub gain_broken: i64,
    pub x_candidates: Vec<NodeId>,
    pub x_cursor: usize,
    pub broken: Option<NodeId>,
    pub y_candidates: Vec<NodeId>,
    pub y_cursor: usize,
    pub added: Option<NodeId>,
}

impl Frame {
    /// Prepare the frame for a new depth, keeping its buffers.
    pub fn reset(&mut self, from: NodeId, gain: i64) {
        self.from = from;
        self.gain = gain;
        self.gain_broken = gain;
        self.x_candidates.clear();
        self.x_cursor = 0;
        self.broken = None;
        self.y_candidates.clear();
        self.y_cursor = 0;
        self.added = None;
    }

    /// `x_q`, if currently removed.
    pub fn broken_edge(&self) -> Option<Edge> {
        self.broken.map(|t| edge(self.from, t))
    }

    /// `y_q`, if currently added.
    pub fn added_edge(&self) -> Option<Edge> {
        match (self.broken, self.added) {
            (Some(b), Some(a)) => Some(edge(b, a)),
            _ => None,
        }
    }
}

/// Which candidate list of the deepest frame ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// No further edge to remove
    X,
    /// No further edge to add
    Y,
}

/// Where the search resumes after a dead end.
///
/// | dead end                  | resume                          |
/// |---------------------------|---------------------------------|
/// | depth >= 3, either list   | next `y_2` (keep `x_1 y_1 x_2`) |
/// | depth 2, `y` list         | next `x_2` (keep `x_1 y_1`)     |
/// | depth 2, `x` list         | next `y_1` (keep `x_1`)         |
/// | depth 1, `y` list         | next `x_1`                      |
/// | depth 1, `x` list         | root exhausted                  |
///
/// Below depth 2 only the first acceptable choice is followed; a failure
/// anywhere deeper falls back to the alternatives for `y_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewind {
    NextX { depth: usize },
    NextY { depth: usize },
}

impl Rewind {
    /// Look up the rewind for a dead end at `depth`, or `None` when the root
    /// has no alternatives left.
    pub fn after(depth: usize, exhausted: Exhausted) -> Option<Rewind> {
        match (depth, exhausted) {
            (0 | 1, Exhausted::X) => None,
            (1, Exhausted::Y) => Some(Rewind::NextX { depth: 1 }),
            (2, Exhausted::X) => Some(Rewind::NextY { depth: 1 }),
            (2, Exhausted::Y) => Some(Rewind::NextX { depth: 2 }),
            _ => Some(Rewind::NextY { depth: 2 }),
        }
    }

    /// Depth whose frame becomes the deepest.
    pub fn depth(&self) -> usize {
        match *self {
            Rewind::NextX { depth } | Rewind::NextY { depth } => depth,
        }
    }

    /// Slot in the backtrack counters.
    pub fn index(&self) -> usize {
        match *self {
            Rewind::NextY { depth: 2 } => 0,
            Rewind::NextX { depth: 2 } => 1,
            Rewind::NextY { .. } => 2,
            Rewind::NextX { .. } => 3,
        }
    }
}
