//! Navigation service
//!
//! Owns the navigation graph, its lookup table and the obstruction oracle
//! for one level, and answers runtime path queries against them. Construct
//! it before any agent that queries it and drop it after them.

use glam::Vec3;

use super::astar::path_length;
use super::generators::NodeGenerator;
use super::graph::{NavGraph, NavGraphBuilder};
use super::oracle::{ObstructionOracle, OpenCellOracle};
use super::persistence::{NavigationStore, PersistError};
use super::string_pull::{StringPullSettings, pulled};
use super::table::{LookupTable, build_lookup_table};
use crate::core::NavigationConfig;

/// Where the current navigation data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSource {
    /// Nothing loaded or built yet
    Empty,
    /// Read from a persisted table
    Loaded,
    /// Generated from the level this run
    Generated,
}

/// Path queries over a prebuilt lookup table.
#[derive(Debug)]
pub struct NavigationService<O: ObstructionOracle> {
    oracle: O,
    config: NavigationConfig,
    graph: NavGraph,
    table: LookupTable,
    source: NavigationSource,
}

impl<O: ObstructionOracle> NavigationService<O> {
    /// Create a service with no navigation data.
    ///
    /// Until a graph is built or loaded, every query degrades to direct
    /// movement toward the goal.
    #[must_use]
    pub fn new(oracle: O, config: NavigationConfig) -> Self {
        Self {
            oracle,
            config,
            graph: NavGraph::default(),
            table: LookupTable::new(),
            source: NavigationSource::Empty,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// The obstruction oracle
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Current graph
    #[must_use]
    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Current lookup table
    #[must_use]
    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    /// Where the current data came from
    #[must_use]
    pub fn source(&self) -> NavigationSource {
        self.source
    }

    fn pull_settings(&self) -> StringPullSettings {
        StringPullSettings {
            max_step_height: self.config.max_step_height,
            agent_radius: self.config.agent_radius,
        }
    }

    /// Run every generator, finalise the graph and build the lookup table.
    ///
    /// This is the expensive all-pairs step; it runs to completion.
    pub fn generate(
        &mut self,
        generators: &mut [Box<dyn NodeGenerator>],
        open: &dyn OpenCellOracle,
    ) {
        let mut builder = NavGraphBuilder::new();
        for generator in generators.iter_mut() {
            if let Some(distance) = self.config.node_distance {
                generator.set_node_distance(distance);
            }
            generator.generate(open, &mut builder);
        }

        let graph = builder.finalize(&self.oracle, self.config.agent_radius);
        self.build(graph);
    }

    /// Build the lookup table for an already finalised graph.
    pub fn build(&mut self, graph: NavGraph) {
        self.table = build_lookup_table(&graph, &self.oracle, &self.pull_settings());
        self.graph = graph;
        self.source = NavigationSource::Generated;
    }

    /// Use a persisted table for `level` if a fresh one exists, otherwise
    /// generate and persist a new one.
    ///
    /// Missing, corrupt, and stale data all fall back to regeneration. A
    /// failure to write the regenerated table is logged and otherwise
    /// ignored: the in-memory data is still valid.
    pub fn load_or_generate(
        &mut self,
        store: &NavigationStore,
        level: &str,
        fingerprint: Option<u64>,
        generators: &mut [Box<dyn NodeGenerator>],
        open: &dyn OpenCellOracle,
    ) -> NavigationSource {
        if let Some(loaded) = store.load(level, fingerprint) {
            self.graph = loaded.graph;
            self.table = loaded.table;
            self.source = NavigationSource::Loaded;
            return self.source;
        }

        self.generate(generators, open);
        if let Err(e) = store.save(level, &self.table, fingerprint) {
            log::warn!("Could not persist navigation table for '{}': {}", level, e);
        }
        self.source
    }

    /// Persist the current table for `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written
    pub fn save(
        &self,
        store: &NavigationStore,
        level: &str,
        fingerprint: Option<u64>,
    ) -> Result<(), PersistError> {
        store.save(level, &self.table, fingerprint)
    }

    /// Drop all navigation data.
    pub fn clear(&mut self) {
        self.graph = NavGraph::default();
        self.table.clear();
        self.source = NavigationSource::Empty;
    }

    /// Nearest graph node to `position`.
    ///
    /// Prefers nodes with a clear, radius-inflated line of sight; if none is
    /// visible, falls back to the nearest node by distance alone.
    #[must_use]
    pub fn nearest(&self, position: Vec3) -> Option<Vec3> {
        let radius = self.config.agent_radius;
        let mut visible: Option<(f32, Vec3)> = None;
        let mut any: Option<(f32, Vec3)> = None;

        for &node in self.graph.nodes() {
            let d2 = node.distance_squared(position);
            if any.is_none_or(|(best, _)| d2 < best) {
                any = Some((d2, node));
            }
            if visible.is_some_and(|(best, _)| d2 >= best) {
                continue;
            }
            if self.oracle.has_line_of_sight(position, node, radius) {
                visible = Some((d2, node));
            }
        }

        if visible.is_none() && any.is_some() {
            log::debug!("No visible navigation node from {position}, using nearest by distance");
        }
        visible.or(any).map(|(_, node)| node)
    }

    /// Waypoints from `position` to `goal`.
    ///
    /// - No navigation data: `[goal]`.
    /// - Direct line of sight: `[position, goal]`. The leading `position` is
    ///   consumed on the first tick of path following.
    /// - Otherwise the table walk between the nearest nodes, string-pulled
    ///   in both directions, whichever is shorter.
    ///
    /// If the walk hits an unreachable pair it stops early and the partial
    /// path is returned without the goal.
    #[must_use]
    pub fn lookup_path(&self, position: Vec3, goal: Vec3) -> Vec<Vec3> {
        if self.table.is_empty() {
            return vec![goal];
        }
        if self
            .oracle
            .has_line_of_sight(position, goal, self.config.agent_radius)
        {
            return vec![position, goal];
        }

        let (Some(nearest_position), Some(nearest_goal)) =
            (self.nearest(position), self.nearest(goal))
        else {
            return vec![goal];
        };

        let walked = self.walk(position, goal, nearest_position, nearest_goal);

        let settings = self.pull_settings();
        let forward = pulled(&walked, &self.oracle, &settings);
        let mut reverse: Vec<Vec3> = walked.iter().rev().copied().collect();
        reverse = pulled(&reverse, &self.oracle, &settings);
        reverse.reverse();

        if path_length(&reverse) < path_length(&forward) {
            reverse
        } else {
            forward
        }
    }

    /// Raw table walk between the snapped endpoints.
    fn walk(
        &self,
        position: Vec3,
        goal: Vec3,
        nearest_position: Vec3,
        nearest_goal: Vec3,
    ) -> Vec<Vec3> {
        let mut path = vec![position];
        if nearest_position != position {
            path.push(nearest_position);
        }

        let mut current = nearest_position;
        // A well-formed table reaches the goal in fewer steps than there are nodes.
        let mut budget = self.graph.node_count().max(self.table.len()) + 1;
        while current != nearest_goal {
            let next = match self.table.next(current, nearest_goal) {
                Some(next) if budget > 0 => next,
                _ => {
                    log::warn!(
                        "No navigation route from {} to {}, returning partial path",
                        current,
                        nearest_goal
                    );
                    return path;
                }
            };
            budget -= 1;
            path.push(next);
            current = next;
        }

        if goal != nearest_goal {
            path.push(goal);
        }
        path
    }
}
