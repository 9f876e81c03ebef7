//! Nearest-neighbor candidate lists.

use itertools::Itertools;

use crate::oracle::DistanceOracle;
use crate::problem::NodeId;

/// For every city, the `m` closest other cities sorted by distance.
#[derive(Debug, Clone)]
pub struct CandidateLists {
    size: usize,
    /// Indexed by city id; row 0 is unused
    lists: Vec<Vec<NodeId>>,
}

impl CandidateLists {
    /// Precompute lists of size `min(m, n - 1)`. Ties are broken by id.
    pub fn nearest<O: DistanceOracle>(oracle: &O, m: usize) -> Self {
        let n = oracle.n();
        let size = m.min(n.saturating_sub(1));
        let mut lists = Vec::with_capacity(n + 1);
        lists.push(Vec::new());

        for city in 1..=n {
            let list = (1..=n)
                .filter(|&other| other != city)
                .sorted_by_key(|&other| (oracle.distance(city, other), other))
                .take(size)
                .collect();
            lists.push(list);
        }

        CandidateLists { size, lists }
    }

    /// Effective list size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Candidates of `city`, closest first.
    pub fn of(&self, city: NodeId) -> &[NodeId] {
        &self.lists[city]
    }
}
