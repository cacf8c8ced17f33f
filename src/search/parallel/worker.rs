//! Search worker: expands frontier batches and reports back to the coordinator.

use crate::error::GridError;
use crate::grid::Grid;
use crate::search::config::SearchConfig;
use crate::search::frontier::Frontier;
use crate::search::parallel::channel::{
    CoordinatorMessage, WorkItem, WorkerChannels, WorkerMessage,
};
use crate::search::result::WorkerStatistics;
use tracing::debug;

/// What happened to one dispatched work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expansion {
    /// Target claimed; remaining local work abandoned.
    Found,
    /// Local frontier emptied within the threshold.
    Exhausted,
    /// Threshold reached; this many nodes were handed back as overflow.
    Overflowed(usize),
    /// Stop was raised mid-expansion; remaining local work abandoned.
    Interrupted,
}

/// One member of the worker pool.
///
/// Idle while blocked on its mailbox, expanding while handling a single
/// [`WorkItem`]. Each item is acknowledged with exactly one
/// [`WorkerMessage::Received`], preceded by any overflow it produced and, if
/// it claimed the target, by [`WorkerMessage::Found`].
pub struct Worker<'g> {
    id: usize,
    grid: &'g Grid,
    config: &'g SearchConfig,
    channels: WorkerChannels,
    statistics: WorkerStatistics,
}

impl<'g> Worker<'g> {
    pub fn new(
        id: usize,
        grid: &'g Grid,
        config: &'g SearchConfig,
        channels: WorkerChannels,
    ) -> Self {
        Self {
            id,
            grid,
            config,
            channels,
            statistics: WorkerStatistics::default(),
        }
    }

    /// Process mailbox messages until `Stop` (or until the coordinator goes
    /// away). Dropping the worker acknowledges with `Stopped`.
    pub fn run(mut self) -> WorkerStatistics {
        while let Ok(message) = self.channels.from_coordinator.recv() {
            match message {
                CoordinatorMessage::Work(item) => self.handle(item),
                CoordinatorMessage::Stop => break,
            }
        }
        self.statistics
    }

    fn handle(&mut self, item: WorkItem) {
        if self.channels.shared.should_stop() {
            self.statistics.items_skipped += 1;
        } else {
            debug!(worker = self.id, node = %item.node, "worker begin work");
            self.statistics.items_processed += 1;

            match self.expand(item) {
                Ok(Expansion::Found) => {
                    debug!(worker = self.id, target = %item.target, "worker claimed target");
                    self.send(WorkerMessage::Found {
                        worker_id: self.id,
                        node: item.target,
                    });
                }
                Ok(Expansion::Overflowed(count)) => {
                    debug!(worker = self.id, count, "worker handed back overflow");
                }
                Ok(Expansion::Exhausted) | Ok(Expansion::Interrupted) => {}
                Err(error) => {
                    debug!(worker = self.id, %error, "worker failed");
                    self.send(WorkerMessage::Failed {
                        worker_id: self.id,
                        error,
                    });
                }
            }
        }

        debug!(worker = self.id, "worker work done");
        self.send(WorkerMessage::Received { worker_id: self.id });
    }

    fn expand(&mut self, item: WorkItem) -> Result<Expansion, GridError> {
        let target = self.grid.node(item.target)?;
        let start = self.grid.node(item.node)?;

        let mut frontier = Frontier::new(self.config, target.position());
        frontier.push(start.id(), &start.position());

        let mut dequeued = 0;
        while dequeued < self.config.threshold {
            if self.channels.shared.should_stop() {
                return Ok(Expansion::Interrupted);
            }
            let Some(id) = frontier.pop() else {
                return Ok(Expansion::Exhausted);
            };
            dequeued += 1;
            self.statistics.nodes_expanded += 1;

            let node = self.grid.node(id)?;
            for &neighbor_id in node.neighbors() {
                let neighbor = self.grid.node(neighbor_id)?;
                if !neighbor.try_claim(node)? {
                    self.statistics.claims_lost += 1;
                    continue;
                }
                self.statistics.claims_won += 1;
                if neighbor_id == item.target {
                    return Ok(Expansion::Found);
                }
                frontier.push(neighbor_id, &neighbor.position());
            }
        }

        if frontier.is_empty() {
            return Ok(Expansion::Exhausted);
        }

        debug!(worker = self.id, remaining = frontier.len(), "worker get new work");
        let mut overflow = 0;
        for node in frontier.drain() {
            let _ = self
                .channels
                .to_coordinator
                .send(WorkerMessage::Work(WorkItem::new(node, item.target)));
            overflow += 1;
        }
        self.statistics.overflow_sent += overflow as u64;
        Ok(Expansion::Overflowed(overflow))
    }

    fn send(&self, message: WorkerMessage) {
        // The coordinator outlives every worker acknowledgment it waits for;
        // a closed channel only happens once it has already given up.
        let _ = self.channels.to_coordinator.send(message);
    }
}

impl Drop for Worker<'_> {
    // Also runs while unwinding, so the coordinator hears about a worker that
    // died mid-item instead of waiting for it forever.
    fn drop(&mut self) {
        debug!(worker = self.id, "worker quitting");
        self.send(WorkerMessage::Stopped {
            worker_id: self.id,
            statistics: self.statistics,
        });
    }
}
