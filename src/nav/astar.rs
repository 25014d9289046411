//! A* search over the navigation graph
//!
//! Edge cost is Euclidean distance and the heuristic is the straight-line
//! distance to the goal, so the first time the goal is popped its path is
//! optimal.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::graph::NavGraph;

/// Per-node bookkeeping for a single search.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    /// Cost from start
    g_cost: f32,
    /// Heuristic cost to goal, cached on first visit
    h_cost: f32,
    /// Predecessor on the best known path
    parent: Option<usize>,
    /// Expanded already
    closed: bool,
    /// Visited at all this search
    visited: bool,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            g_cost: f32::INFINITY,
            h_cost: 0.0,
            parent: None,
            closed: false,
            visited: false,
        }
    }
}

/// Open set entry
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    node: usize,
    f_cost: f32,
    h_cost: f32,
    tie: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap: lowest f first, then lowest h, then oldest.
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.h_cost.total_cmp(&self.h_cost))
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable scratch space so the all-pairs builder does not reallocate per
/// search.
#[derive(Debug, Default)]
pub struct AStar {
    nodes: Vec<SearchNode>,
    open: BinaryHeap<OpenNode>,
}

impl AStar {
    /// Create an empty search context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the cheapest node path from `start` to `goal`.
    ///
    /// Returns node indices from `start` to `goal` inclusive, or `None` if
    /// the goal is unreachable.
    pub fn find_path(&mut self, graph: &NavGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
        if start >= graph.node_count() || goal >= graph.node_count() {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        self.nodes.clear();
        self.nodes.resize(graph.node_count(), SearchNode::default());
        self.open.clear();

        let goal_position = graph.position(goal);
        let mut tie: u64 = 0;

        let h0 = graph.position(start).distance(goal_position);
        self.nodes[start] = SearchNode {
            g_cost: 0.0,
            h_cost: h0,
            parent: None,
            closed: false,
            visited: true,
        };
        self.open.push(OpenNode {
            node: start,
            f_cost: h0,
            h_cost: h0,
            tie,
        });

        while let Some(current) = self.open.pop() {
            if self.nodes[current.node].closed {
                // Stale heap entry.
                continue;
            }
            if current.node == goal {
                return Some(self.reconstruct_path(goal));
            }
            self.nodes[current.node].closed = true;

            let current_g = self.nodes[current.node].g_cost;
            let current_position = graph.position(current.node);

            for &next in graph.neighbors(current.node) {
                let record = self.nodes[next];
                if record.closed {
                    continue;
                }

                let next_position = graph.position(next);
                let tentative_g = current_g + current_position.distance(next_position);
                if record.visited && tentative_g >= record.g_cost {
                    continue;
                }

                let h_cost = if record.visited {
                    record.h_cost
                } else {
                    next_position.distance(goal_position)
                };
                self.nodes[next] = SearchNode {
                    g_cost: tentative_g,
                    h_cost,
                    parent: Some(current.node),
                    closed: false,
                    visited: true,
                };

                tie += 1;
                self.open.push(OpenNode {
                    node: next,
                    f_cost: tentative_g + h_cost,
                    h_cost,
                    tie,
                });
            }
        }

        // No path found
        None
    }

    fn reconstruct_path(&self, goal: usize) -> Vec<usize> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(prev) = self.nodes[current].parent {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        path
    }
}

/// Find a path with a one-off search context.
#[must_use]
pub fn find_path(graph: &NavGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
    AStar::new().find_path(graph, start, goal)
}

/// Total Euclidean length of a polyline
#[must_use]
pub fn path_length(waypoints: &[glam::Vec3]) -> f32 {
    waypoints.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{Connection, NavGraph};
    use glam::Vec3;

    fn connection(a: Vec3, b: Vec3) -> Connection {
        Connection { a, b }
    }

    #[test]
    fn test_direct_neighbour() {
        let graph = NavGraph::from_connections(&[connection(Vec3::ZERO, Vec3::X)]);
        assert_eq!(find_path(&graph, 0, 1), Some(vec![0, 1]));
    }

    #[test]
    fn test_start_is_goal() {
        let graph = NavGraph::from_connections(&[connection(Vec3::ZERO, Vec3::X)]);
        assert_eq!(find_path(&graph, 1, 1), Some(vec![1]));
    }

    #[test]
    fn test_prefers_shorter_route() {
        // Square A-B-D and A-C-D, with the C detour pushed far out.
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 1.0);
        let c = Vec3::new(1.0, 0.0, -5.0);
        let d = Vec3::new(2.0, 0.0, 0.0);
        let graph = NavGraph::from_connections(&[
            connection(a, c),
            connection(c, d),
            connection(a, b),
            connection(b, d),
        ]);

        let path = find_path(&graph, graph.index_of(a).unwrap(), graph.index_of(d).unwrap())
            .unwrap();
        let positions: Vec<Vec3> = path.iter().map(|&i| graph.position(i)).collect();
        assert_eq!(positions, vec![a, b, d]);
    }

    #[test]
    fn test_no_path() {
        let graph = NavGraph::from_connections(&[
            connection(Vec3::ZERO, Vec3::X),
            connection(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0)),
        ]);
        assert!(find_path(&graph, 0, 2).is_none());
    }

    #[test]
    fn test_reuse_between_searches() {
        let graph = NavGraph::from_connections(&[
            connection(Vec3::ZERO, Vec3::X),
            connection(Vec3::X, Vec3::new(2.0, 0.0, 0.0)),
        ]);
        let mut search = AStar::new();
        assert_eq!(search.find_path(&graph, 0, 2), Some(vec![0, 1, 2]));
        assert_eq!(search.find_path(&graph, 2, 0), Some(vec![2, 1, 0]));
    }

    #[test]
    fn test_path_length() {
        let length = path_length(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)]);
        assert!((length - 2.0).abs() < 1e-6);
    }
}
