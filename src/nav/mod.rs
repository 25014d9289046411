//! Navigation module
//!
//! Builds a sparse waypoint graph from level geometry, precomputes an
//! all-pairs (current, goal) -> next lookup table over it, persists that
//! table per level, and answers runtime path queries from it.
//!
//! Geometry is only ever seen through the [`ObstructionOracle`] and
//! [`OpenCellOracle`] traits; [`OccupancyGrid`] implements both for a
//! discretised level.

mod astar;
mod generators;
mod graph;
mod occupancy;
mod oracle;
mod persistence;
mod service;
mod string_pull;
mod table;

pub use astar::{AStar, find_path, path_length};
pub use generators::{CornerGraphGenerator, Footprint, GridGenerator, NodeGenerator};
pub use graph::{Connection, NavGraph, NavGraphBuilder, NodeKey};
pub use occupancy::OccupancyGrid;
pub use oracle::{ObstructionOracle, OpenCellOracle, OpenSpace};
pub use persistence::{
    NavigationStore, PersistError, PersistedNavigation, TABLE_EXTENSION, format_table, load_table,
    parse_table, save_table,
};
pub use service::{NavigationService, NavigationSource};
pub use string_pull::{StringPullSettings, pulled, string_pull};
pub use table::{LookupEntry, LookupTable, build_lookup_table};
