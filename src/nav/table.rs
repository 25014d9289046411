//! Navigation lookup table
//!
//! A precomputed `(current, goal) -> next` relation built by running A*
//! between every ordered pair of graph nodes once, so that runtime path
//! queries are table walks instead of searches.

use std::time::Instant;

use glam::Vec3;
use rustc_hash::FxHashMap;

use super::astar::AStar;
use super::graph::{NavGraph, NodeKey};
use super::oracle::ObstructionOracle;
use super::string_pull::{StringPullSettings, string_pull};

/// "Standing at `current` and heading for `goal`, go to `next`."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupEntry {
    /// Where the agent is
    pub current: Vec3,
    /// Where the agent ultimately wants to be
    pub goal: Vec3,
    /// Node to move toward next
    pub next: Vec3,
}

/// All lookup entries for one navigation graph.
///
/// At most one entry exists per `(current, goal)` pair.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: Vec<LookupEntry>,
    index: FxHashMap<(NodeKey, NodeKey), usize>,
}

impl LookupTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Returns `false` (and keeps the existing entry) if the
    /// `(current, goal)` pair is already present.
    pub fn insert(&mut self, entry: LookupEntry) -> bool {
        let key = (
            NodeKey::from_position(entry.current),
            NodeKey::from_position(entry.goal),
        );
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Next node when standing at `current` and heading for `goal`
    #[must_use]
    pub fn next(&self, current: Vec3, goal: Vec3) -> Option<Vec3> {
        let key = (NodeKey::from_position(current), NodeKey::from_position(goal));
        self.index.get(&key).map(|&i| self.entries[i].next)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[LookupEntry] {
        &self.entries
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl FromIterator<LookupEntry> for LookupTable {
    fn from_iter<I: IntoIterator<Item = LookupEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Build the lookup table for `graph`.
///
/// Runs A* for every ordered pair of distinct nodes, string-pulls each path
/// and records one entry per consecutive waypoint pair. Unreachable pairs
/// are skipped. Cost is cubic in the node count, so this is meant for the
/// sparse graphs corner generation produces.
pub fn build_lookup_table<O>(
    graph: &NavGraph,
    oracle: &O,
    settings: &StringPullSettings,
) -> LookupTable
where
    O: ObstructionOracle + ?Sized,
{
    let started = Instant::now();
    let node_count = graph.node_count();
    let mut table = LookupTable::new();
    let mut search = AStar::new();
    let mut unreachable = 0usize;

    for start in 0..node_count {
        for goal in 0..node_count {
            if start == goal {
                continue;
            }
            let Some(nodes) = search.find_path(graph, start, goal) else {
                unreachable += 1;
                continue;
            };

            let mut waypoints: Vec<Vec3> = nodes.iter().map(|&i| graph.position(i)).collect();
            string_pull(&mut waypoints, oracle, settings);

            let goal_position = graph.position(goal);
            for pair in waypoints.windows(2) {
                table.insert(LookupEntry {
                    current: pair[0],
                    goal: goal_position,
                    next: pair[1],
                });
            }
        }
    }

    log::info!(
        "Built navigation lookup table: {} nodes, {} entries, {} unreachable pairs in {:.2?}",
        node_count,
        table.len(),
        unreachable,
        started.elapsed()
    );
    table
}
