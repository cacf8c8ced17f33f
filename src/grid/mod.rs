//! Immutable 3-D grid graph with per-node ownership slots
//!
//! The topology (nodes and neighbor lists) is fixed when a [`GridBuilder`] is
//! frozen. During a search the only mutable state is each node's owner slot,
//! which is written at most once through [`Grid::claim`]. Everything else is
//! read concurrently by all workers without synchronization.

pub mod builder;
pub mod node;

pub use builder::{build_grid, GridBuilder, GridConfig, DEFAULT_GRID_SIZE, DEFAULT_SEED};
pub use node::{Claim, Node, NodeId, Position};

use crate::error::GridError;
use std::collections::{BTreeMap, VecDeque};

/// Fraction of each axis at which the default target sits.
pub const TARGET_FRACTION: f64 = 0.80;

/// A fixed mapping from node id to node.
#[derive(Debug)]
pub struct Grid {
    size: usize,
    nodes: Vec<Node>,
}

impl Grid {
    pub(crate) fn from_nodes(size: usize, nodes: Vec<Node>) -> Self {
        Self { size, nodes }
    }

    /// Edge length of the lattice.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node, failing on ids outside the grid.
    pub fn node(&self, id: NodeId) -> Result<&Node, GridError> {
        self.nodes.get(id.index()).ok_or(GridError::UnknownNode {
            id,
            node_count: self.nodes.len(),
        })
    }

    /// Id of the node at the given coordinates.
    pub fn id_at(&self, position: Position) -> Result<NodeId, GridError> {
        if position.i < self.size && position.j < self.size && position.k < self.size {
            Ok(builder::id_at(self.size, position))
        } else {
            Err(GridError::OutOfBounds {
                position,
                size: self.size,
            })
        }
    }

    /// The node at [`TARGET_FRACTION`] of every axis.
    pub fn default_target(&self) -> NodeId {
        default_target(self.size)
    }

    /// Attempt to record `owner` as the discoverer of `node`.
    ///
    /// Returns `Ok(true)` for the single successful claim and `Ok(false)` for
    /// every other attempt. Unknown ids and unclaimed owners are errors.
    pub fn claim(&self, node: NodeId, owner: NodeId) -> Result<bool, GridError> {
        let owner = self.node(owner)?;
        self.node(node)?.try_claim(owner)
    }

    /// Pre-claim the search root so that it can never be discovered by a worker.
    pub fn claim_root(&self, root: NodeId) -> Result<(), GridError> {
        if self.node(root)?.claim_as_root() {
            Ok(())
        } else {
            Err(GridError::RootAlreadyClaimed(root))
        }
    }

    /// Discoverer of a node. Only meaningful once a search has returned.
    pub fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        self.claim_of(id).map(|claim| claim.owner)
    }

    pub fn claim_of(&self, id: NodeId) -> Option<Claim> {
        self.nodes.get(id.index()).and_then(Node::claim)
    }

    /// Number of nodes holding a claim, root included.
    pub fn claimed_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_claimed()).count()
    }

    /// Clear every owner slot so the grid can host another search.
    ///
    /// Requires exclusive access; no search can be running.
    pub fn reset_claims(&mut self) {
        for node in &mut self.nodes {
            node.clear_claim();
        }
    }

    /// Number of nodes reachable from `start`, `start` included.
    pub fn component_size(&self, start: NodeId) -> Result<usize, GridError> {
        Ok(self.reachable_from(start)?.iter().filter(|&&seen| seen).count())
    }

    /// Whether `to` is reachable from `from` over the grid's edges.
    pub fn is_reachable(&self, from: NodeId, to: NodeId) -> Result<bool, GridError> {
        self.node(to)?;
        Ok(self.reachable_from(from)?[to.index()])
    }

    fn reachable_from(&self, start: NodeId) -> Result<Vec<bool>, GridError> {
        self.node(start)?;
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        seen[start.index()] = true;
        queue.push_back(start);

        while let Some(id) = queue.pop_front() {
            for &neighbor in self.nodes[id.index()].neighbors() {
                if !seen[neighbor.index()] {
                    seen[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        Ok(seen)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors().len()).sum::<usize>() / 2
    }

    pub fn statistics(&self) -> GridStatistics {
        let mut degree_histogram = BTreeMap::new();
        for node in &self.nodes {
            *degree_histogram.entry(node.neighbors().len()).or_insert(0) += 1;
        }
        GridStatistics {
            size: self.size,
            node_count: self.nodes.len(),
            edge_count: self.edge_count(),
            degree_histogram,
        }
    }
}

/// Id of the node at `floor(0.8 * size)` on every axis of a `size³` grid.
pub fn default_target(size: usize) -> NodeId {
    let axis = ((TARGET_FRACTION * size as f64) as usize).min(size.saturating_sub(1));
    builder::id_at(size, Position::new(axis, axis, axis))
}

/// Summary of a grid's topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStatistics {
    pub size: usize,
    pub node_count: usize,
    pub edge_count: usize,
    /// Number of nodes per neighbor count
    pub degree_histogram: BTreeMap<usize, usize>,
}

impl GridStatistics {
    pub fn average_degree(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            (2 * self.edge_count) as f64 / self.node_count as f64
        }
    }
}
