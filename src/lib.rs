//! Parallel best-first search over a randomly connected 3-D grid.
//!
//! A grid is built once ([`grid::build_grid`]), a search is run from a root
//! towards a target by a coordinator and a fixed pool of worker threads
//! ([`search::run_search`]), and the resulting ownership can be inspected
//! afterwards ([`grid::Grid::owner_of`]).

pub mod error;
pub mod grid;
pub mod search;

pub use error::{ConfigError, GridError, SearchError};
pub use grid::{build_grid, Grid, NodeId};
pub use search::{run_search, SearchConfig, SearchOutcome};
