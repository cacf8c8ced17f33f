//! Search coordinator: owns the worker pool, dispatches work round-robin and
//! detects termination.

use crate::error::SearchError;
use crate::grid::{Grid, NodeId};
use crate::search::config::SearchConfig;
use crate::search::parallel::channel::{
    create_channels, CoordinatorChannels, CoordinatorMessage, WorkItem, WorkerMessage,
};
use crate::search::parallel::worker::Worker;
use crate::search::result::{SearchOutcome, SearchStatistics, Termination, WorkerStatistics};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Search from `root` towards `target` with a pool of worker threads.
///
/// Blocks until every worker has acknowledged stop. The root is claimed by
/// itself before any work is dispatched, so the grid must not carry claims
/// from a previous run (see [`Grid::reset_claims`]). After return, ownership
/// can be read with [`Grid::owner_of`].
pub fn run_search(
    grid: &Grid,
    root: NodeId,
    target: NodeId,
    config: &SearchConfig,
) -> Result<SearchOutcome, SearchError> {
    let start_time = Instant::now();
    config.validate()?;
    grid.node(target)?;
    grid.claim_root(root)?;

    if root == target {
        return Ok(SearchOutcome::trivial(
            root,
            config.num_workers,
            start_time.elapsed(),
        ));
    }

    let num_workers = config.num_workers;
    let (coordinator_channels, worker_channels) = create_channels(num_workers);

    let report = thread::scope(|scope| {
        let handles: Vec<_> = worker_channels
            .into_iter()
            .enumerate()
            .map(|(worker_id, channels)| {
                scope.spawn(move || Worker::new(worker_id, grid, config, channels).run())
            })
            .collect();

        let mut report =
            Coordinator::new(coordinator_channels, num_workers).run(WorkItem::new(root, target));

        // Dropping the coordinator closed every mailbox, so joins cannot hang.
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(statistics) => report.statistics[worker_id] = statistics,
                Err(_) => {
                    report.failure.get_or_insert(SearchError::WorkerLost(worker_id));
                }
            }
        }
        report
    });

    if let Some(error) = report.failure {
        return Err(error);
    }

    let found = report.termination == Some(Termination::Found);
    let statistics = SearchStatistics {
        dispatched: report.dispatched,
        completed: report.completed,
        rejected_after_stop: report.rejected_after_stop,
        elapsed_time: start_time.elapsed(),
        workers: report.statistics,
    };
    info!(
        found,
        dispatched = statistics.dispatched,
        completed = statistics.completed,
        elapsed_ms = statistics.elapsed_time.as_millis() as u64,
        "search finished"
    );

    Ok(SearchOutcome {
        found,
        root,
        target,
        termination: report.termination.unwrap_or(Termination::Exhausted),
        found_by: report.found_by,
        statistics,
    })
}

/// Everything the coordinator learned by the time the last worker stopped.
#[derive(Debug)]
struct CoordinatorReport {
    termination: Option<Termination>,
    found_by: Option<usize>,
    dispatched: u64,
    completed: u64,
    rejected_after_stop: u64,
    statistics: Vec<WorkerStatistics>,
    failure: Option<SearchError>,
}

/// Coordinator state. Counters are touched only by the coordinator's own
/// message loop.
struct Coordinator {
    channels: CoordinatorChannels,
    num_workers: usize,
    dispatched: u64,
    completed: u64,
    rejected_after_stop: u64,
    stopped_workers: usize,
    stopping: bool,
    termination: Option<Termination>,
    found_by: Option<usize>,
    failure: Option<SearchError>,
    statistics: Vec<WorkerStatistics>,
}

impl Coordinator {
    fn new(channels: CoordinatorChannels, num_workers: usize) -> Self {
        Self {
            channels,
            num_workers,
            dispatched: 0,
            completed: 0,
            rejected_after_stop: 0,
            stopped_workers: 0,
            stopping: false,
            termination: None,
            found_by: None,
            failure: None,
            statistics: vec![WorkerStatistics::default(); num_workers],
        }
    }

    /// Seed the search with `initial` and process messages until every worker
    /// has stopped.
    fn run(mut self, initial: WorkItem) -> CoordinatorReport {
        self.dispatch(initial);

        while self.stopped_workers < self.num_workers {
            match self.channels.from_workers.recv() {
                Ok(message) => self.handle(message),
                Err(_) => {
                    // Every worker dropped its sender without acknowledging stop
                    self.failure.get_or_insert(SearchError::Disconnected);
                    break;
                }
            }
        }

        debug!("master quitting");
        CoordinatorReport {
            termination: self.termination,
            found_by: self.found_by,
            dispatched: self.dispatched,
            completed: self.completed,
            rejected_after_stop: self.rejected_after_stop,
            statistics: self.statistics,
            failure: self.failure,
        }
    }

    fn handle(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Work(item) => self.dispatch(item),
            WorkerMessage::Received { worker_id } => {
                self.completed += 1;
                debug!(
                    worker = worker_id,
                    completed = self.completed,
                    dispatched = self.dispatched,
                    "master receive"
                );
                if self.completed == self.dispatched {
                    self.termination.get_or_insert(Termination::Exhausted);
                    self.shutdown();
                }
            }
            WorkerMessage::Found { worker_id, node } => {
                debug!(worker = worker_id, target = %node, "master done");
                self.termination = Some(Termination::Found);
                self.found_by.get_or_insert(worker_id);
                self.shutdown();
            }
            WorkerMessage::Failed { worker_id, error } => {
                self.failure.get_or_insert(SearchError::Worker {
                    worker_id,
                    source: error,
                });
                self.shutdown();
            }
            WorkerMessage::Stopped {
                worker_id,
                statistics,
            } => {
                self.stopped_workers += 1;
                if let Some(slot) = self.statistics.get_mut(worker_id) {
                    *slot = statistics;
                }
                debug!(
                    worker = worker_id,
                    stopped = self.stopped_workers,
                    "master stop"
                );
                // A worker exiting before shutdown took its queued items with it
                if !self.stopping {
                    self.failure.get_or_insert(SearchError::WorkerLost(worker_id));
                    self.shutdown();
                }
            }
        }
    }

    /// Forward a work item to the next worker in round-robin order.
    fn dispatch(&mut self, item: WorkItem) {
        if self.stopping {
            self.rejected_after_stop += 1;
            return;
        }

        let worker_id = (self.dispatched % self.num_workers as u64) as usize;
        self.dispatched += 1;
        debug!(worker = worker_id, node = %item.node, "master work");

        if self.channels.to_workers[worker_id]
            .send(CoordinatorMessage::Work(item))
            .is_err()
        {
            // The item can never be acknowledged
            self.dispatched -= 1;
            self.failure.get_or_insert(SearchError::WorkerLost(worker_id));
            self.shutdown();
        }
    }

    /// Broadcast stop once, however many triggers arrive.
    fn shutdown(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        self.channels.shared.signal_stop();
        for tx in &self.channels.to_workers {
            let _ = tx.send(CoordinatorMessage::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, GridError};
    use crate::grid::{build_grid, GridBuilder};
    use crate::search::parallel::channel::WorkerChannels;

    fn cube(size: usize) -> GridBuilder {
        GridBuilder::new(size).unwrap()
    }

    fn config(workers: usize, threshold: usize) -> SearchConfig {
        SearchConfig::default()
            .with_workers(workers)
            .with_threshold(threshold)
    }

    fn assert_distances_consistent(grid: &Grid, root: NodeId) {
        for node in grid.nodes() {
            let Some(claim) = node.claim() else { continue };
            if node.id() == root {
                assert_eq!(claim.owner, root);
                assert_eq!(claim.distance_from_root, 0.0);
                continue;
            }
            let owner = grid.node(claim.owner).unwrap();
            let owner_claim = owner.claim().expect("owner must be claimed");
            let expected = owner_claim.distance_from_root + node.distance_to(owner);
            assert!(
                (claim.distance_from_root - expected).abs() < 1e-9,
                "node {} distance {} != {}",
                node.id(),
                claim.distance_from_root,
                expected
            );
            assert!(claim.distance_from_root > 0.0);
        }
    }

    #[test]
    fn test_fully_connected_single_worker() {
        let grid = cube(2).connect_all().build();
        let outcome = run_search(&grid, NodeId(0), NodeId(7), &config(1, 100)).unwrap();

        assert!(outcome.found);
        assert_eq!(outcome.termination, Termination::Found);
        assert_eq!(outcome.found_by, Some(0));
        assert!(grid.claimed_count() >= 2);
        assert!(grid.owner_of(NodeId(7)).is_some());
        assert!(outcome.statistics.is_balanced());
        assert_distances_consistent(&grid, NodeId(0));
    }

    #[test]
    fn test_disconnected_target_exhausts() {
        let mut builder = cube(2).connect_all();
        builder.isolate(NodeId(7)).unwrap();
        let grid = builder.build();

        let outcome = run_search(&grid, NodeId(0), NodeId(7), &config(1, 100)).unwrap();

        assert!(!outcome.found);
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(outcome.found_by, None);
        assert_eq!(grid.claimed_count(), 7);
        assert_eq!(grid.claimed_count(), grid.component_size(NodeId(0)).unwrap());
        assert_eq!(grid.owner_of(NodeId(7)), None);
        assert!(outcome.statistics.is_balanced());
    }

    #[test]
    fn test_disconnected_target_with_many_workers_and_tiny_threshold() {
        let mut builder = cube(4).with_random_edges(11);
        let target = crate::grid::default_target(4);
        builder.isolate(target).unwrap();
        let grid = builder.build();
        let component = grid.component_size(NodeId(0)).unwrap();

        let outcome = run_search(&grid, NodeId(0), target, &config(4, 1)).unwrap();

        assert!(!outcome.found);
        assert_eq!(grid.claimed_count(), component);
        assert!(outcome.statistics.is_balanced());
        assert_eq!(outcome.statistics.rejected_after_stop, 0);
        // Every claimed node except the root was expanded exactly once
        assert_eq!(
            outcome.statistics.totals().nodes_expanded as usize,
            component
        );
        assert_distances_consistent(&grid, NodeId(0));
    }

    #[test]
    fn test_threshold_does_not_change_result() {
        for seed in [1, 2, 3] {
            let mut results = Vec::new();
            for threshold in [1, 1000] {
                let grid = build_grid(5, seed).unwrap();
                let target = grid.default_target();
                let reachable = grid.is_reachable(NodeId(0), target).unwrap();
                let outcome = run_search(&grid, NodeId(0), target, &config(4, threshold)).unwrap();
                assert_eq!(outcome.found, reachable);
                assert!(outcome.statistics.is_balanced());
                assert_distances_consistent(&grid, NodeId(0));
                results.push(outcome.found);
            }
            assert_eq!(results[0], results[1], "seed {}", seed);
        }
    }

    #[test]
    fn test_round_robin_spreads_overflow() {
        let grid = build_grid(6, 5).unwrap();
        let target = grid.default_target();
        let outcome = run_search(&grid, NodeId(0), target, &config(3, 1)).unwrap();

        assert!(outcome.statistics.is_balanced());
        assert!(outcome.statistics.dispatched > 3);
        let handled: Vec<u64> = outcome
            .statistics
            .workers
            .iter()
            .map(|w| w.items_processed + w.items_skipped)
            .collect();
        // Dispatch i goes to worker i % 3
        let dispatched = outcome.statistics.dispatched;
        for (worker_id, count) in handled.iter().enumerate() {
            let expected = (dispatched + 2 - worker_id as u64) / 3;
            assert_eq!(*count, expected, "worker {}", worker_id);
        }
    }

    #[test]
    fn test_root_equals_target() {
        let grid = cube(2).connect_all().build();
        let outcome = run_search(&grid, NodeId(3), NodeId(3), &config(2, 10)).unwrap();

        assert!(outcome.found);
        assert_eq!(outcome.termination, Termination::Trivial);
        assert_eq!(outcome.statistics.dispatched, 0);
        assert_eq!(grid.claimed_count(), 1);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let grid = cube(2).connect_all().build();
        assert_eq!(
            run_search(&grid, NodeId(0), NodeId(7), &config(1, 0)).unwrap_err(),
            SearchError::Config(ConfigError::ZeroThreshold)
        );
        assert_eq!(
            run_search(&grid, NodeId(0), NodeId(7), &config(0, 10)).unwrap_err(),
            SearchError::Config(ConfigError::ZeroWorkers)
        );
        // Nothing was claimed by the rejected runs
        assert_eq!(grid.claimed_count(), 0);
    }

    #[test]
    fn test_rejects_unknown_nodes() {
        let grid = cube(2).connect_all().build();
        assert!(matches!(
            run_search(&grid, NodeId(0), NodeId(8), &config(1, 10)),
            Err(SearchError::Grid(GridError::UnknownNode { .. }))
        ));
        assert!(matches!(
            run_search(&grid, NodeId(9), NodeId(7), &config(1, 10)),
            Err(SearchError::Grid(GridError::UnknownNode { .. }))
        ));
    }

    #[test]
    fn test_rerun_requires_reset() {
        let mut grid = cube(2).connect_all().build();
        run_search(&grid, NodeId(0), NodeId(7), &config(2, 10)).unwrap();
        assert_eq!(
            run_search(&grid, NodeId(0), NodeId(7), &config(2, 10)).unwrap_err(),
            SearchError::Grid(GridError::RootAlreadyClaimed(NodeId(0)))
        );

        grid.reset_claims();
        let outcome = run_search(&grid, NodeId(0), NodeId(7), &config(2, 10)).unwrap();
        assert!(outcome.found);
    }

    fn drain(channels: &WorkerChannels) -> Vec<CoordinatorMessage> {
        channels.from_coordinator.try_iter().collect()
    }

    #[test]
    fn test_found_then_received_stops_once() {
        let (channels, workers) = create_channels(2);
        let mut coordinator = Coordinator::new(channels, 2);
        let item = WorkItem::new(NodeId(0), NodeId(7));

        coordinator.dispatch(item);
        coordinator.handle(WorkerMessage::Found {
            worker_id: 0,
            node: NodeId(7),
        });
        coordinator.handle(WorkerMessage::Received { worker_id: 0 });

        assert_eq!(coordinator.termination, Some(Termination::Found));
        assert_eq!(coordinator.found_by, Some(0));
        assert!(coordinator.channels.shared.should_stop());
        assert_eq!(
            drain(&workers[0]),
            vec![CoordinatorMessage::Work(item), CoordinatorMessage::Stop]
        );
        assert_eq!(drain(&workers[1]), vec![CoordinatorMessage::Stop]);

        // Overflow arriving after shutdown is dropped, not dispatched
        coordinator.handle(WorkerMessage::Work(WorkItem::new(NodeId(3), NodeId(7))));
        assert_eq!(coordinator.rejected_after_stop, 1);
        assert_eq!(coordinator.dispatched, 1);
        assert_eq!(coordinator.completed, 1);
        assert!(drain(&workers[0]).is_empty());
        assert!(drain(&workers[1]).is_empty());
    }

    #[test]
    fn test_early_stopped_worker_is_lost() {
        let (channels, workers) = create_channels(2);
        let mut coordinator = Coordinator::new(channels, 2);
        coordinator.dispatch(WorkItem::new(NodeId(0), NodeId(7)));

        // Worker 0 exits while its item is still outstanding
        coordinator.handle(WorkerMessage::Stopped {
            worker_id: 0,
            statistics: WorkerStatistics::default(),
        });

        assert_eq!(coordinator.failure, Some(SearchError::WorkerLost(0)));
        assert!(coordinator.channels.shared.should_stop());
        assert_eq!(drain(&workers[1]), vec![CoordinatorMessage::Stop]);

        // The remaining worker's acknowledgment is the normal one
        coordinator.handle(WorkerMessage::Stopped {
            worker_id: 1,
            statistics: WorkerStatistics::default(),
        });
        assert_eq!(coordinator.stopped_workers, 2);
        assert_eq!(coordinator.failure, Some(SearchError::WorkerLost(0)));
    }

    #[test]
    fn test_trivial_search_is_timed() {
        let grid = cube(2).connect_all().build();
        let before = Instant::now();
        let outcome = run_search(&grid, NodeId(5), NodeId(5), &config(1, 10)).unwrap();
        assert!(outcome.statistics.elapsed_time <= before.elapsed());
        assert!(outcome.statistics.is_balanced());
    }

    #[test]
    fn test_large_grid_many_workers() {
        let grid = build_grid(12, crate::grid::DEFAULT_SEED).unwrap();
        let target = grid.default_target();
        let reachable = grid.is_reachable(NodeId(0), target).unwrap();

        let outcome = run_search(&grid, NodeId(0), target, &config(8, 16)).unwrap();

        assert_eq!(outcome.found, reachable);
        assert!(outcome.statistics.is_balanced());
        assert_eq!(outcome.statistics.workers.len(), 8);
        let totals = outcome.statistics.totals();
        assert_eq!(totals.claims_won as usize + 1, grid.claimed_count());
        assert_distances_consistent(&grid, NodeId(0));
    }
}
