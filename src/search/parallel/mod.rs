//! Parallel frontier expansion with a coordinator and a fixed worker pool.
//!
//! # Architecture
//!
//! - A **coordinator** (running on the calling thread) dispatches every work
//!   item round-robin, counts dispatched vs. completed items and decides when
//!   the search is over
//! - **Workers** expand batches of frontier nodes, claiming neighbors through
//!   the grid's write-once owner slots and handing overflow back
//! - A **channel system** carries work, acknowledgments and stop signals
//! - A **shared stop flag** lets in-flight expansions wind down between
//!   dequeues
//!
//! The search ends when the target is claimed or when every dispatched item
//! has been acknowledged; either way the coordinator waits for every worker to
//! acknowledge stop before returning.
//!
//! # Example
//!
//! ```
//! use guided_search::grid::{build_grid, NodeId};
//! use guided_search::search::{run_search, SearchConfig};
//!
//! let grid = build_grid(5, 42).unwrap();
//! let target = grid.default_target();
//! let config = SearchConfig::default().with_workers(4).with_threshold(64);
//!
//! let outcome = run_search(&grid, NodeId(0), target, &config).unwrap();
//! assert_eq!(outcome.found, grid.owner_of(target).is_some());
//! ```

pub mod channel;
pub mod coordinator;
pub mod worker;

pub use channel::{WorkItem, WorkerMessage};
pub use coordinator::run_search;
