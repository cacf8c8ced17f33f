//! Worker-local frontier queue
//!
//! FIFO order keeps a single bucket. Best-first order spreads nodes over
//! `priorities` buckets by estimated distance to the target, each bucket
//! covering `priority_granularity` units, and always pops from the lowest
//! non-empty bucket. Within a bucket nodes leave in insertion order.

use crate::grid::{NodeId, Position};
use crate::search::config::{ExpansionOrder, SearchConfig};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct Frontier {
    order: ExpansionOrder,
    target: Position,
    granularity: f64,
    buckets: Vec<VecDeque<NodeId>>,
    len: usize,
}

impl Frontier {
    pub fn new(config: &SearchConfig, target: Position) -> Self {
        let bucket_count = match config.order {
            ExpansionOrder::Fifo => 1,
            ExpansionOrder::BestFirst => config.priorities.max(1),
        };
        Self {
            order: config.order,
            target,
            granularity: config.priority_granularity.max(1) as f64,
            buckets: (0..bucket_count).map(|_| VecDeque::new()).collect(),
            len: 0,
        }
    }

    fn bucket_for(&self, position: &Position) -> usize {
        match self.order {
            ExpansionOrder::Fifo => 0,
            ExpansionOrder::BestFirst => {
                let estimate = position.distance_to(&self.target) / self.granularity;
                (estimate as usize).min(self.buckets.len() - 1)
            }
        }
    }

    pub fn push(&mut self, id: NodeId, position: &Position) {
        let bucket = self.bucket_for(position);
        self.buckets[bucket].push_back(id);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        let id = self.buckets.iter_mut().find_map(VecDeque::pop_front)?;
        self.len -= 1;
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove everything, in pop order.
    pub fn drain(&mut self) -> impl Iterator<Item = NodeId> + '_ {
        self.len = 0;
        self.buckets.iter_mut().flat_map(|bucket| bucket.drain(..))
    }

    /// Drop everything without yielding it.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }
}
