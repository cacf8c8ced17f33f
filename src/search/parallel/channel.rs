//! Message types and channels between the coordinator and its workers.

use crate::error::GridError;
use crate::grid::NodeId;
use crate::search::result::WorkerStatistics;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Capacity of each coordinator-to-worker mailbox.
pub const WORKER_MAILBOX_CAPACITY: usize = 64;

/// "Expand the neighbors of `node`, looking for `target`."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub node: NodeId,
    pub target: NodeId,
}

impl WorkItem {
    pub fn new(node: NodeId, target: NodeId) -> Self {
        Self { node, target }
    }
}

/// Message sent from workers to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Overflow frontier node to be dispatched to some worker.
    Work(WorkItem),
    /// Worker finished one dispatched work item.
    Received { worker_id: usize },
    /// Worker claimed the target node.
    Found { worker_id: usize, node: NodeId },
    /// Worker hit a malformed grid reference.
    Failed { worker_id: usize, error: GridError },
    /// Worker acknowledged stop and is exiting.
    Stopped {
        worker_id: usize,
        statistics: WorkerStatistics,
    },
}

/// Message sent from coordinator to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorMessage {
    /// Expand a frontier node.
    Work(WorkItem),
    /// Finish and exit.
    Stop,
}

/// Stop flag shared by the coordinator and every worker.
///
/// Workers consult it between dequeues so an in-flight expansion winds down
/// without waiting for the `Stop` message behind queued work.
#[derive(Debug, Default)]
pub struct SharedStop {
    should_stop: AtomicBool,
}

impl SharedStop {
    /// Check if we should stop searching.
    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Acquire)
    }

    /// Raise the flag. Returns true only for the call that raised it.
    pub fn signal_stop(&self) -> bool {
        !self.should_stop.swap(true, Ordering::AcqRel)
    }
}

/// Channel endpoints for a worker.
pub struct WorkerChannels {
    /// Send messages to coordinator.
    pub to_coordinator: Sender<WorkerMessage>,
    /// Receive messages from coordinator.
    pub from_coordinator: Receiver<CoordinatorMessage>,
    /// Shared stop flag.
    pub shared: Arc<SharedStop>,
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    /// Receive messages from workers.
    pub from_workers: Receiver<WorkerMessage>,
    /// Send messages to workers, indexed by worker id.
    pub to_workers: Vec<Sender<CoordinatorMessage>>,
    /// Shared stop flag.
    pub shared: Arc<SharedStop>,
}

/// Create channels for a pool of `num_workers` workers.
///
/// Each worker mailbox holds at most [`WORKER_MAILBOX_CAPACITY`] messages,
/// while the return channel shared by all workers is unbounded. Workers
/// therefore never block while sending overflow, `Received` or `Found`, and
/// the only blocking send in the system is the coordinator's dispatch into a
/// full mailbox. That mailbox's owner keeps receiving without ever waiting on
/// the coordinator, so the two sides cannot deadlock, and a worker that falls
/// behind holds back dispatch instead of growing an unbounded queue.
pub fn create_channels(num_workers: usize) -> (CoordinatorChannels, Vec<WorkerChannels>) {
    let shared = Arc::new(SharedStop::default());

    let (worker_tx, coordinator_rx) = unbounded();

    let mut to_workers = Vec::with_capacity(num_workers);
    let mut worker_channels = Vec::with_capacity(num_workers);

    for _ in 0..num_workers {
        let (coord_tx, worker_rx) = bounded(WORKER_MAILBOX_CAPACITY);
        to_workers.push(coord_tx);
        worker_channels.push(WorkerChannels {
            to_coordinator: worker_tx.clone(),
            from_coordinator: worker_rx,
            shared: Arc::clone(&shared),
        });
    }

    let coordinator = CoordinatorChannels {
        from_workers: coordinator_rx,
        to_workers,
        shared,
    };

    (coordinator, worker_channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_stop_signal() {
        let shared = SharedStop::default();

        assert!(!shared.should_stop());
        assert!(shared.signal_stop());
        assert!(shared.should_stop());

        // Only the first signal reports having raised the flag
        assert!(!shared.signal_stop());
        assert!(shared.should_stop());
    }

    #[test]
    fn test_create_channels() {
        let (coordinator, workers) = create_channels(4);

        assert_eq!(workers.len(), 4);
        assert_eq!(coordinator.to_workers.len(), 4);

        workers[2]
            .to_coordinator
            .send(WorkerMessage::Received { worker_id: 2 })
            .unwrap();

        let received = coordinator.from_workers.recv().unwrap();
        assert_eq!(received, WorkerMessage::Received { worker_id: 2 });
    }

    #[test]
    fn test_mailbox_bounded_return_path_unbounded() {
        let (coordinator, workers) = create_channels(1);
        let item = WorkItem::new(NodeId(1), NodeId(7));

        for _ in 0..WORKER_MAILBOX_CAPACITY {
            coordinator.to_workers[0]
                .try_send(CoordinatorMessage::Work(item))
                .unwrap();
        }
        assert!(coordinator.to_workers[0]
            .try_send(CoordinatorMessage::Stop)
            .unwrap_err()
            .is_full());

        // Reports never hit a capacity limit
        for _ in 0..4 * WORKER_MAILBOX_CAPACITY {
            workers[0]
                .to_coordinator
                .try_send(WorkerMessage::Work(item))
                .unwrap();
        }
        assert_eq!(coordinator.from_workers.len(), 4 * WORKER_MAILBOX_CAPACITY);
    }

    #[test]
    fn test_per_sender_order_is_preserved() {
        let (coordinator, workers) = create_channels(1);
        let item = WorkItem::new(NodeId(4), NodeId(7));

        workers[0]
            .to_coordinator
            .send(WorkerMessage::Work(item))
            .unwrap();
        workers[0]
            .to_coordinator
            .send(WorkerMessage::Received { worker_id: 0 })
            .unwrap();

        assert_eq!(
            coordinator.from_workers.recv().unwrap(),
            WorkerMessage::Work(item)
        );
        assert_eq!(
            coordinator.from_workers.recv().unwrap(),
            WorkerMessage::Received { worker_id: 0 }
        );
    }

    #[test]
    fn test_coordinator_broadcast() {
        let (coordinator, workers) = create_channels(3);

        for tx in &coordinator.to_workers {
            tx.send(CoordinatorMessage::Stop).unwrap();
        }

        for (i, worker) in workers.iter().enumerate() {
            let msg = worker.from_coordinator.recv().unwrap();
            assert_eq!(
                msg,
                CoordinatorMessage::Stop,
                "Worker {} received unexpected message",
                i
            );
        }
    }
}
