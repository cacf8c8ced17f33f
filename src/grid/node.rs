//! Grid nodes and their write-once ownership slot

use crate::error::GridError;
use std::fmt;
use std::sync::OnceLock;

/// Index of a node inside its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Lattice coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl Position {
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// Euclidean distance between two lattice points.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let di = self.i as f64 - other.i as f64;
        let dj = self.j as f64 - other.j as f64;
        let dk = self.k as f64 - other.k as f64;
        (di * di + dj * dj + dk * dk).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}

/// Recorded discovery of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Claim {
    /// Node whose expansion discovered this one (the root owns itself).
    pub owner: NodeId,
    /// Path length from the root along the chain of owners.
    pub distance_from_root: f64,
}

/// A grid node: fixed topology plus a single-assignment owner slot.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    position: Position,
    neighbors: Vec<NodeId>,
    claim: OnceLock<Claim>,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Position, neighbors: Vec<NodeId>) -> Self {
        Self {
            id,
            position,
            neighbors,
            claim: OnceLock::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Current claim, if any.
    pub fn claim(&self) -> Option<Claim> {
        self.claim.get().copied()
    }

    pub fn is_claimed(&self) -> bool {
        self.claim.get().is_some()
    }

    /// Try to record `owner` as the discoverer of this node.
    ///
    /// Exactly one caller ever succeeds; every later or concurrent attempt
    /// returns `Ok(false)` and leaves the existing claim untouched. The owner
    /// must itself be claimed so the distance from root can be derived.
    pub fn try_claim(&self, owner: &Node) -> Result<bool, GridError> {
        let base = owner
            .claim()
            .ok_or(GridError::UnclaimedFrontier(owner.id))?
            .distance_from_root;
        let claim = Claim {
            owner: owner.id,
            distance_from_root: base + self.distance_to(owner),
        };
        Ok(self.claim.set(claim).is_ok())
    }

    /// Mark this node as the search root: owned by itself at distance zero.
    pub(crate) fn claim_as_root(&self) -> bool {
        self.claim
            .set(Claim {
                owner: self.id,
                distance_from_root: 0.0,
            })
            .is_ok()
    }

    pub(crate) fn clear_claim(&mut self) {
        self.claim.take();
    }
}
