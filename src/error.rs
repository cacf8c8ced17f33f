//! Error types for grid construction, configuration and search execution

use crate::grid::{NodeId, Position};
use thiserror::Error;

/// Errors raised while building or querying a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid size must be at least 1")]
    ZeroSize,

    #[error("grid size {0} overflows the node id space")]
    SizeOverflow(usize),

    #[error("node {id} does not exist (grid has {node_count} nodes)")]
    UnknownNode { id: NodeId, node_count: usize },

    #[error("position {position} lies outside a grid of size {size}")]
    OutOfBounds { position: Position, size: usize },

    #[error("cannot connect node {0} to itself")]
    SelfLoop(NodeId),

    #[error("frontier node {0} has no owner")]
    UnclaimedFrontier(NodeId),

    #[error("root node {0} is already claimed; reset the grid before searching again")]
    RootAlreadyClaimed(NodeId),
}

/// Rejected search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("threshold must be at least 1")]
    ZeroThreshold,

    #[error("worker pool must contain at least one worker")]
    ZeroWorkers,

    #[error("priorities must be at least 1")]
    ZeroPriorities,

    #[error("priority granularity must be at least 1")]
    ZeroGranularity,
}

/// Errors returned by [`crate::run_search`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("worker {worker_id} failed: {source}")]
    Worker {
        worker_id: usize,
        #[source]
        source: GridError,
    },

    #[error("worker {0} terminated without acknowledging stop")]
    WorkerLost(usize),

    #[error("all workers disconnected before the search terminated")]
    Disconnected,
}
