//! Parallel guided search over a grid
//!
//! Frontier expansion is FIFO by default. Best-first order is available as an
//! option and only changes which nodes a worker expands first, never whether
//! the target is reached.

pub mod config;
pub mod frontier;
pub mod parallel;
pub mod result;

pub use config::{ExpansionOrder, SearchConfig};
pub use parallel::run_search;
pub use result::{SearchOutcome, SearchStatistics, Termination, WorkerStatistics};
