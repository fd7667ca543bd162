//! Lifetime cost counters
//!
//! Links, cuts and heapify swaps are the unit costs of the amortized analysis.
//! They only ever grow; a meld adds the absorbed heap's history to the
//! receiver's.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCounters {
    /// Trees made a child of another tree during successive linking
    pub links: u64,
    /// Nodes cut from their parent by a lazy decrease-key
    pub cuts: u64,
    /// Item exchanges performed by an eager decrease-key
    pub heapify_cost: u64,
}

impl CostCounters {
    /// Sum of all three counters
    pub fn total(&self) -> u64 {
        self.links + self.cuts + self.heapify_cost
    }

    /// Cost of everything that happened between `earlier` and `self`.
    ///
    /// # Panics
    ///
    /// Panics if any counter of `earlier` is larger, i.e. if the snapshots
    /// were taken in the wrong order.
    pub fn cost_since(&self, earlier: &CostCounters) -> u64 {
        let delta = |now: u64, then: u64| {
            now.checked_sub(then)
                .expect("cost counters are monotonic; snapshots taken out of order")
        };
        delta(self.links, earlier.links)
            + delta(self.cuts, earlier.cuts)
            + delta(self.heapify_cost, earlier.heapify_cost)
    }
}

impl Add for CostCounters {
    type Output = CostCounters;

    fn add(mut self, rhs: CostCounters) -> CostCounters {
        self += rhs;
        self
    }
}

impl AddAssign for CostCounters {
    fn add_assign(&mut self, rhs: CostCounters) {
        self.links += rhs.links;
        self.cuts += rhs.cuts;
        self.heapify_cost += rhs.heapify_cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_since() {
        let before = CostCounters {
            links: 3,
            cuts: 1,
            heapify_cost: 0,
        };
        let after = CostCounters {
            links: 7,
            cuts: 2,
            heapify_cost: 5,
        };
        assert_eq!(after.cost_since(&before), 10);
        assert_eq!(after.total(), 14);
        assert_eq!((before + after).links, 10);
    }

    #[test]
    #[should_panic(expected = "monotonic")]
    fn test_cost_since_out_of_order() {
        let before = CostCounters {
            links: 3,
            ..Default::default()
        };
        CostCounters::default().cost_since(&before);
    }
}
