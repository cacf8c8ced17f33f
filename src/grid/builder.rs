//! Grid construction: lattice layout plus seeded random connectivity

use crate::error::GridError;
use crate::grid::node::{Node, NodeId, Position};
use crate::grid::Grid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default lattice edge length.
pub const DEFAULT_GRID_SIZE: usize = 30;

/// Default seed for neighbor generation.
pub const DEFAULT_SEED: u64 = 123_456;

/// Configuration for building a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    /// Number of nodes along each axis
    pub size: usize,
    /// Seed for the connectivity generator
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl GridConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(&self) -> Result<Grid, GridError> {
        build_grid(self.size, self.seed)
    }
}

/// Build a `size³` grid whose forward neighbors are chosen by a generator
/// seeded with `seed`. The same inputs always produce the same topology.
pub fn build_grid(size: usize, seed: u64) -> Result<Grid, GridError> {
    Ok(GridBuilder::new(size)?.with_random_edges(seed).build())
}

/// Mutable topology under construction. Consumed by [`GridBuilder::build`],
/// after which adjacency can no longer change.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    size: usize,
    adjacency: Vec<Vec<NodeId>>,
}

impl GridBuilder {
    /// Start a lattice with no edges.
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let node_count = size
            .checked_mul(size)
            .and_then(|square| square.checked_mul(size))
            .ok_or(GridError::SizeOverflow(size))?;

        Ok(Self {
            size,
            adjacency: vec![Vec::new(); node_count],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn check(&self, id: NodeId) -> Result<(), GridError> {
        if id.index() < self.adjacency.len() {
            Ok(())
        } else {
            Err(GridError::UnknownNode {
                id,
                node_count: self.adjacency.len(),
            })
        }
    }

    /// Add an undirected edge. Returns `false` if the edge already existed.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<bool, GridError> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Err(GridError::SelfLoop(a));
        }
        Ok(self.link(a, b))
    }

    fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if self.adjacency[a.index()].contains(&b) {
            return false;
        }
        self.adjacency[a.index()].push(b);
        self.adjacency[b.index()].push(a);
        true
    }

    /// Connect every pair of distinct nodes.
    pub fn connect_all(mut self) -> Self {
        let count = self.adjacency.len();
        for a in 0..count {
            for b in (a + 1)..count {
                self.link(NodeId(a), NodeId(b));
            }
        }
        self
    }

    /// Remove every edge touching `id`. Returns how many edges were removed.
    pub fn isolate(&mut self, id: NodeId) -> Result<usize, GridError> {
        self.check(id)?;
        let removed = std::mem::take(&mut self.adjacency[id.index()]);
        for neighbor in &removed {
            self.adjacency[neighbor.index()].retain(|&n| n != id);
        }
        Ok(removed.len())
    }

    /// Randomly connect each node to some of its forward lattice neighbors.
    ///
    /// For each node the six offsets in `{0,1}³` other than `(0,0,0)` and
    /// `(1,1,1)` are visited in lexicographic order; each is taken with
    /// probability 1/2, except that `(1,1,0)` is always taken when no earlier
    /// offset produced a new edge. Targets are clamped to the lattice, so
    /// offsets that collapse onto the node itself are skipped.
    pub fn with_random_edges(mut self, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let last = self.size - 1;

        for id in 0..self.adjacency.len() {
            let origin = self.position_of(NodeId(id));
            let mut offset_index = 0;
            let mut added = 0;

            for di in 0..2 {
                for dj in 0..2 {
                    for dk in 0..2 {
                        offset_index += 1;
                        if offset_index == 1 || offset_index == 8 {
                            continue;
                        }

                        let forced = offset_index == 7 && added == 0;
                        if !(forced || rng.random_bool(0.5)) {
                            continue;
                        }

                        let target = Position::new(
                            (origin.i + di).min(last),
                            (origin.j + dj).min(last),
                            (origin.k + dk).min(last),
                        );
                        let target_id = self.id_at(target);
                        if target_id.index() != id && self.link(NodeId(id), target_id) {
                            added += 1;
                        }
                    }
                }
            }
        }

        self
    }

    pub(crate) fn position_of(&self, id: NodeId) -> Position {
        position_of(self.size, id)
    }

    pub(crate) fn id_at(&self, position: Position) -> NodeId {
        id_at(self.size, position)
    }

    /// Freeze the topology.
    pub fn build(self) -> Grid {
        let size = self.size;
        let nodes = self
            .adjacency
            .into_iter()
            .enumerate()
            .map(|(index, neighbors)| {
                let id = NodeId(index);
                Node::new(id, position_of(size, id), neighbors)
            })
            .collect();
        Grid::from_nodes(size, nodes)
    }
}

pub(crate) fn position_of(size: usize, id: NodeId) -> Position {
    let index = id.index();
    Position::new(index / (size * size), (index / size) % size, index % size)
}

pub(crate) fn id_at(size: usize, position: Position) -> NodeId {
    NodeId(size * size * position.i + size * position.j + position.k)
}
