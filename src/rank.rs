//! Bounded top-K selection over scored candidates

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::config::validate_rank_params;
use crate::error::Result;
use crate::similarity::Scorer;
use crate::types::{Candidate, ScoredCandidate};

/// Heap entry ordered so that "greater" means "better match"
#[derive(Debug)]
struct Ranked {
    key:  (OrderedFloat<f64>, Reverse<u64>),
    item: ScoredCandidate,
}

impl Ranked {
    fn new(item: ScoredCandidate) -> Self {
        Self { key: (OrderedFloat(item.score), Reverse(item.candidate.order)), item }
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Keeps the best `k` candidates at or above a cutoff in O(k) memory
///
/// Better means higher score, then lower discovery order. The worst kept
/// entry sits on top of a min-heap and is only replaced by a strictly better
/// one, so an equal score never evicts an earlier discovery and the kept set
/// does not depend on the order results arrive in.
#[derive(Debug)]
pub struct TopK {
    k:      usize,
    cutoff: f64,
    heap:   BinaryHeap<Reverse<Ranked>>,
}

impl TopK {
    /// Create an empty selection
    ///
    /// # Errors
    /// Returns `InvalidK` when `k == 0` and `InvalidCutoff` when `cutoff` is
    /// outside `[0, 1]`.
    pub fn new(k: usize, cutoff: f64) -> Result<Self> {
        validate_rank_params(k, cutoff)?;
        Ok(Self { k, cutoff, heap: BinaryHeap::with_capacity(k) })
    }

    /// Offer a scored candidate, returning whether it was kept
    pub fn offer(&mut self, scored: ScoredCandidate) -> bool {
        // NaN fails this too
        if !(scored.score >= self.cutoff) {
            return false;
        }
        if self.heap.iter().any(|Reverse(kept)| kept.item.path() == scored.path()) {
            return false;
        }

        let ranked = Ranked::new(scored);
        if self.heap.len() < self.k {
            self.heap.push(Reverse(ranked));
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut worst) if ranked > worst.0 => {
                *worst = Reverse(ranked);
                true
            },
            _ => false,
        }
    }

    /// Number of kept candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing has been kept
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Kept candidates, best first
    #[must_use]
    pub fn into_sorted(self) -> Vec<ScoredCandidate> {
        debug_assert!(self.heap.len() <= self.k);
        self.heap.into_sorted_vec().into_iter().map(|Reverse(ranked)| ranked.item).collect()
    }
}

/// Rank `candidates` by similarity of their names to `query`
///
/// Returns at most `k` matches scoring at least `cutoff`, ordered by score
/// descending and then by discovery order.
///
/// # Errors
/// Returns `InvalidK` or `InvalidCutoff` before consuming any candidate.
pub fn rank<I>(candidates: I, query: &str, k: usize, cutoff: f64) -> Result<Vec<ScoredCandidate>>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut top = TopK::new(k, cutoff)?;
    let mut scorer = Scorer::new(query);
    for candidate in candidates {
        if let Some(score) = scorer.score_at_least(&candidate.name, cutoff) {
            top.offer(ScoredCandidate { candidate, score });
        }
    }
    Ok(top.into_sorted())
}
