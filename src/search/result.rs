//! Search outcome and statistics

use crate::grid::NodeId;
use std::time::Duration;

/// Counters kept by a single worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatistics {
    /// Work items expanded
    pub items_processed: u64,
    /// Work items acknowledged without expansion because stop was signalled
    pub items_skipped: u64,
    /// Frontier nodes dequeued and expanded
    pub nodes_expanded: u64,
    /// Successful claims
    pub claims_won: u64,
    /// Claims lost to an existing owner
    pub claims_lost: u64,
    /// Overflow work items handed back to the coordinator
    pub overflow_sent: u64,
}

impl WorkerStatistics {
    pub fn merge(&mut self, other: &WorkerStatistics) {
        self.items_processed += other.items_processed;
        self.items_skipped += other.items_skipped;
        self.nodes_expanded += other.nodes_expanded;
        self.claims_won += other.claims_won;
        self.claims_lost += other.claims_lost;
        self.overflow_sent += other.overflow_sent;
    }
}

/// Statistics from a search run
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Work items forwarded to workers
    pub dispatched: u64,
    /// Work items acknowledged by workers
    pub completed: u64,
    /// Overflow requests that arrived after shutdown began and were dropped
    pub rejected_after_stop: u64,
    /// Total time between seeding and full termination
    pub elapsed_time: Duration,
    /// Per-worker counters, indexed by worker id
    pub workers: Vec<WorkerStatistics>,
}

impl SearchStatistics {
    /// Counters summed over every worker.
    pub fn totals(&self) -> WorkerStatistics {
        let mut total = WorkerStatistics::default();
        for worker in &self.workers {
            total.merge(worker);
        }
        total
    }

    /// Whether every dispatched work item was acknowledged.
    pub fn is_balanced(&self) -> bool {
        self.dispatched == self.completed
    }
}

/// How a search terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The target was claimed
    Found,
    /// Every work item completed without reaching the target
    Exhausted,
    /// Root and target are the same node
    Trivial,
}

/// Result of [`crate::run_search`]
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Whether the target was reached
    pub found: bool,
    pub root: NodeId,
    pub target: NodeId,
    pub termination: Termination,
    /// Worker that claimed the target, if any
    pub found_by: Option<usize>,
    pub statistics: SearchStatistics,
}

impl SearchOutcome {
    pub(crate) fn trivial(root: NodeId, num_workers: usize, elapsed_time: Duration) -> Self {
        Self {
            found: true,
            root,
            target: root,
            termination: Termination::Trivial,
            found_by: None,
            statistics: SearchStatistics {
                elapsed_time,
                workers: vec![WorkerStatistics::default(); num_workers],
                ..Default::default()
            },
        }
    }
}
