//! Navigation graph
//!
//! Nodes are 3D waypoints identified by their exact position. Node
//! generators place nodes into a [`NavGraphBuilder`]; a single finalisation
//! pass then connects every pair of nodes that are close enough and can see
//! each other, and prunes whatever ends up isolated.

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::oracle::ObstructionOracle;

/// Slack applied to the connection distance so that neighbours exactly one
/// grid step apart are not lost to float rounding.
const DISTANCE_EPSILON: f32 = 1e-4;

/// Hashable identity of a node position.
///
/// Two positions map to the same key iff their coordinates are bitwise
/// equal, with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey([u32; 3]);

impl NodeKey {
    /// Key for a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        let bits = |v: f32| if v == 0.0 { 0.0f32.to_bits() } else { v.to_bits() };
        Self([bits(position.x), bits(position.y), bits(position.z)])
    }

    /// Position this key was made from
    #[must_use]
    pub fn position(self) -> Vec3 {
        Vec3::new(
            f32::from_bits(self.0[0]),
            f32::from_bits(self.0[1]),
            f32::from_bits(self.0[2]),
        )
    }
}

impl From<Vec3> for NodeKey {
    fn from(position: Vec3) -> Self {
        Self::from_position(position)
    }
}

/// An undirected edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// One end
    pub a: Vec3,
    /// The other end
    pub b: Vec3,
}

impl Connection {
    /// Traversal cost (Euclidean length)
    #[must_use]
    pub fn cost(&self) -> f32 {
        self.a.distance(self.b)
    }

    /// Order-independent identity of this connection
    #[must_use]
    pub fn key(&self) -> (NodeKey, NodeKey) {
        let ka = NodeKey::from_position(self.a);
        let kb = NodeKey::from_position(self.b);
        if ka <= kb { (ka, kb) } else { (kb, ka) }
    }
}

/// Collects nodes from one or more generators before finalisation.
#[derive(Debug, Default)]
pub struct NavGraphBuilder {
    nodes: Vec<Vec3>,
    seen: FxHashSet<NodeKey>,
    node_distance: Option<f32>,
}

impl NavGraphBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a node. Returns `false` if a node already sits at `position`.
    pub fn add_node(&mut self, position: Vec3) -> bool {
        if !self.seen.insert(NodeKey::from_position(position)) {
            return false;
        }
        self.nodes.push(position);
        true
    }

    /// Number of placed nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Placed nodes, in placement order
    #[must_use]
    pub fn nodes(&self) -> &[Vec3] {
        &self.nodes
    }

    /// Register the connection distance a generator wants.
    ///
    /// With several generators the widest request wins; any request of zero
    /// or less makes the distance unlimited.
    pub fn request_node_distance(&mut self, distance: f32) {
        self.node_distance = Some(match self.node_distance {
            None => distance,
            Some(current) if current <= 0.0 || distance <= 0.0 => 0.0,
            Some(current) => current.max(distance),
        });
    }

    /// Effective maximum connection distance (`None` = unlimited)
    #[must_use]
    pub fn node_distance(&self) -> Option<f32> {
        match self.node_distance {
            Some(d) if d > 0.0 => Some(d),
            _ => None,
        }
    }

    /// Connect and prune.
    ///
    /// Every pair of nodes within the connection distance whose
    /// `agent_radius`-inflated segment is clear becomes a connection. Nodes
    /// left without any connection are dropped.
    pub fn finalize<O>(self, oracle: &O, agent_radius: f32) -> NavGraph
    where
        O: ObstructionOracle + ?Sized,
    {
        let max_distance = self.node_distance();
        let nodes = self.nodes;
        let mut edges = Vec::new();

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (a, b) = (nodes[i], nodes[j]);
                if let Some(max) = max_distance {
                    if a.distance(b) > max + DISTANCE_EPSILON {
                        continue;
                    }
                }
                if oracle.is_obstructed(a, b, agent_radius) {
                    continue;
                }
                edges.push((i, j));
            }
        }

        let graph = NavGraph::from_edges(&nodes, &edges);
        log::info!(
            "Navigation graph finalized: {} of {} nodes kept, {} connections",
            graph.node_count(),
            nodes.len(),
            graph.connection_count()
        );
        graph
    }
}

/// Finalised, immutable navigation graph.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    nodes: Vec<Vec3>,
    index: FxHashMap<NodeKey, usize>,
    adjacency: Vec<SmallVec<[usize; 8]>>,
    edges: Vec<(usize, usize)>,
}

impl NavGraph {
    /// Build a graph from node positions and index pairs, dropping duplicate
    /// edges and nodes that no edge touches.
    fn from_edges(nodes: &[Vec3], edges: &[(usize, usize)]) -> Self {
        let mut used = vec![false; nodes.len()];
        for &(a, b) in edges {
            used[a] = true;
            used[b] = true;
        }

        let mut graph = Self::default();
        let mut remap = vec![usize::MAX; nodes.len()];
        for (old, &position) in nodes.iter().enumerate() {
            if used[old] {
                remap[old] = graph.push_node(position);
            }
        }
        for &(a, b) in edges {
            graph.connect(remap[a], remap[b]);
        }
        graph
    }

    /// Build a graph from explicit connections.
    ///
    /// Nodes are the distinct endpoints of `connections`.
    #[must_use]
    pub fn from_connections(connections: &[Connection]) -> Self {
        let mut graph = Self::default();
        for connection in connections {
            let a = graph.intern(connection.a);
            let b = graph.intern(connection.b);
            graph.connect(a, b);
        }
        graph
    }

    fn intern(&mut self, position: Vec3) -> usize {
        match self.index.get(&NodeKey::from_position(position)) {
            Some(&i) => i,
            None => self.push_node(position),
        }
    }

    fn push_node(&mut self, position: Vec3) -> usize {
        let i = self.nodes.len();
        self.nodes.push(position);
        self.index.insert(NodeKey::from_position(position), i);
        self.adjacency.push(SmallVec::new());
        i
    }

    fn connect(&mut self, a: usize, b: usize) {
        if a == b || self.adjacency[a].contains(&b) {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.edges.push((a.min(b), a.max(b)));
    }

    /// Number of nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node positions
    #[must_use]
    pub fn nodes(&self) -> &[Vec3] {
        &self.nodes
    }

    /// Position of node `i`
    #[must_use]
    pub fn position(&self, i: usize) -> Vec3 {
        self.nodes[i]
    }

    /// Index of the node at exactly `position`
    #[must_use]
    pub fn index_of(&self, position: Vec3) -> Option<usize> {
        self.index.get(&NodeKey::from_position(position)).copied()
    }

    /// Indices of the nodes connected to node `i`
    #[must_use]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjacency[i]
    }

    /// Cost of travelling the connection between two node indices, if any.
    #[must_use]
    pub fn cost(&self, a: usize, b: usize) -> Option<f32> {
        self.adjacency[a]
            .contains(&b)
            .then(|| self.nodes[a].distance(self.nodes[b]))
    }

    /// All connections
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.edges.iter().map(|&(a, b)| Connection {
            a: self.nodes[a],
            b: self.nodes[b],
        })
    }
}
