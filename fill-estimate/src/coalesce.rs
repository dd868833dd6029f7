//! Run-coalescing estimator.
//!
//! Probes fired about once per second against the same cache copy see the
//! same TTL countdown shifted by up to a second of jitter. Expiry instants
//! that form consecutive one-second runs are therefore folded before
//! counting:
//!
//! - a lone instant counts once
//! - a run of two counts once (the later instant)
//! - a run of `n >= 3` counts its `n - 2` interior instants; the two edges
//!   are treated as jitter against neighbouring runs

/// A maximal sequence of instants, each one second after its predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    instants: Vec<i64>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn first(&self) -> Option<i64> {
        self.instants.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.instants.last().copied()
    }

    /// Instants of this run that are counted as distinct fill events
    pub fn representatives(&self) -> &[i64] {
        match self.instants.len() {
            0 | 1 => &self.instants,
            2 => &self.instants[1..],
            n => &self.instants[1..n - 1],
        }
    }
}

/// `true` when `next` directly follows `prev`. A missing neighbour is
/// infinitely distant and never adjacent.
fn adjacent(prev: Option<i64>, next: i64) -> bool {
    match prev {
        Some(p) => p.checked_add(1) == Some(next),
        None => false,
    }
}

/// Deduplicate, sort and split instants into maximal one-second runs.
pub fn runs(instants: &[i64]) -> Vec<Run> {
    let mut sorted = instants.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs: Vec<Run> = Vec::new();
    let mut prev = None;
    for instant in sorted {
        match runs.last_mut() {
            Some(run) if adjacent(prev, instant) => run.instants.push(instant),
            _ => runs.push(Run {
                instants: vec![instant],
            }),
        }
        prev = Some(instant);
    }
    runs
}

/// All counted instants across the runs, ascending.
pub fn representatives(instants: &[i64]) -> Vec<i64> {
    runs(instants)
        .iter()
        .flat_map(|run| run.representatives().iter().copied())
        .collect()
}

/// Number of inferred cache-fill events.
pub fn count_fills(instants: &[i64]) -> usize {
    runs(instants)
        .iter()
        .map(|run| run.representatives().len())
        .sum()
}
