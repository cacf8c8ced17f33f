//! Configuration types for the parallel search

use crate::error::ConfigError;

/// Default number of workers in the pool.
pub const DEFAULT_WORKERS: usize = 20;
/// Default number of local dequeues per work item before overflowing.
pub const DEFAULT_THRESHOLD: usize = 1024;
/// Default number of priority buckets for best-first expansion.
pub const DEFAULT_PRIORITIES: usize = 30;
/// Default distance span of one priority bucket.
pub const DEFAULT_PRIORITY_GRANULARITY: usize = 8;

/// Order in which a worker expands its local frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionOrder {
    /// First in, first out
    #[default]
    Fifo,
    /// Lowest estimated distance to target first, bucketed by priority
    BestFirst,
}

impl std::fmt::Display for ExpansionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpansionOrder::Fifo => write!(f, "fifo"),
            ExpansionOrder::BestFirst => write!(f, "best-first"),
        }
    }
}

impl std::str::FromStr for ExpansionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "fifo" | "bfs" => Ok(ExpansionOrder::Fifo),
            "best-first" | "best" | "priority" => Ok(ExpansionOrder::BestFirst),
            _ => Err(format!(
                "Unknown expansion order: '{}'. Valid options: fifo, best-first",
                s
            )),
        }
    }
}

/// Configuration for a search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of worker threads in the pool
    pub num_workers: usize,
    /// Maximum dequeues a worker performs for one work item
    pub threshold: usize,
    /// Number of priority buckets (best-first order only)
    pub priorities: usize,
    /// Distance covered by one priority bucket (best-first order only)
    pub priority_granularity: usize,
    /// Local frontier ordering
    pub order: ExpansionOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            threshold: DEFAULT_THRESHOLD,
            priorities: DEFAULT_PRIORITIES,
            priority_granularity: DEFAULT_PRIORITY_GRANULARITY,
            order: ExpansionOrder::Fifo,
        }
    }
}

impl SearchConfig {
    /// One worker per available core.
    pub fn per_core() -> Self {
        Self::default().with_workers(num_cpus::get())
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_priorities(mut self, priorities: usize) -> Self {
        self.priorities = priorities;
        self
    }

    pub fn with_priority_granularity(mut self, granularity: usize) -> Self {
        self.priority_granularity = granularity;
        self
    }

    pub fn with_order(mut self, order: ExpansionOrder) -> Self {
        self.order = order;
        self
    }

    /// Reject settings that would make the search meaningless or flood the
    /// coordinator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.num_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.priorities == 0 {
            return Err(ConfigError::ZeroPriorities);
        }
        if self.priority_granularity == 0 {
            return Err(ConfigError::ZeroGranularity);
        }
        Ok(())
    }
}
