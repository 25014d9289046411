//! Node generators
//!
//! Generators place nodes into a [`NavGraphBuilder`] by scanning the level
//! footprint through an [`OpenCellOracle`]. They do not connect nodes; that
//! happens once, in [`NavGraphBuilder::finalize`], after every generator has
//! run.

use glam::{Vec2, Vec3};

use super::graph::NavGraphBuilder;
use super::oracle::OpenCellOracle;

/// The four diagonal directions, as (dx, dz).
const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// A strategy for placing navigation nodes.
pub trait NodeGenerator {
    /// Place nodes into `builder`.
    fn generate(&self, open: &dyn OpenCellOracle, builder: &mut NavGraphBuilder);

    /// Set the maximum connection distance (zero or less = unlimited).
    fn set_node_distance(&mut self, distance: f32);
}

/// Discretised footprint a generator scans.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    /// Width in cells (X axis)
    pub width: i32,
    /// Depth in cells (Z axis)
    pub depth: i32,
    /// Cell size in world units
    pub cell_size: f32,
    /// World XZ position of the corner of cell (0, 0)
    pub origin: Vec2,
    /// Height nodes are placed at
    pub height: f32,
}

impl Footprint {
    /// Footprint of `width` x `depth` cells at the world origin
    #[must_use]
    pub fn new(width: i32, depth: i32, cell_size: f32) -> Self {
        Self {
            width,
            depth,
            cell_size,
            origin: Vec2::ZERO,
            height: 0.0,
        }
    }

    /// Move the footprint corner
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Set the node placement height
    #[must_use]
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// World position of the centre of a cell
    #[must_use]
    pub fn cell_center(&self, x: i32, z: i32) -> Vec3 {
        Vec3::new(
            self.origin.x + (x as f32 + 0.5) * self.cell_size,
            self.height,
            self.origin.y + (z as f32 + 0.5) * self.cell_size,
        )
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.depth).flat_map(move |z| (0..self.width).map(move |x| (x, z)))
    }
}

/// Places a node at the centre of every open cell.
#[derive(Debug, Clone)]
pub struct GridGenerator {
    footprint: Footprint,
    node_distance: f32,
}

impl GridGenerator {
    /// Create a grid generator; nodes connect to orthogonal neighbours only.
    #[must_use]
    pub fn new(footprint: Footprint) -> Self {
        Self {
            footprint,
            node_distance: footprint.cell_size,
        }
    }
}

impl NodeGenerator for GridGenerator {
    fn generate(&self, open: &dyn OpenCellOracle, builder: &mut NavGraphBuilder) {
        let before = builder.node_count();
        for (x, z) in self.footprint.cells() {
            if open.is_open_cell(x, z) {
                builder.add_node(self.footprint.cell_center(x, z));
            }
        }
        builder.request_node_distance(self.node_distance);
        log::debug!(
            "Grid generator placed {} nodes",
            builder.node_count() - before
        );
    }

    fn set_node_distance(&mut self, distance: f32) {
        self.node_distance = distance;
    }
}

/// Places sparse nodes just outside the convex corners of closed cells.
///
/// For each closed cell and each diagonal direction, a node is placed when
/// both orthogonal neighbours on that side are open (a convex corner) and a
/// `clearance` x `clearance` block of cells in that direction is entirely
/// open. The node sits `offset` units diagonally out from the corner.
#[derive(Debug, Clone)]
pub struct CornerGraphGenerator {
    footprint: Footprint,
    clearance: i32,
    offset: f32,
    node_distance: f32,
}

impl CornerGraphGenerator {
    /// Create a corner generator with one cell of clearance and an
    /// unlimited connection distance.
    #[must_use]
    pub fn new(footprint: Footprint) -> Self {
        Self {
            footprint,
            clearance: 1,
            offset: footprint.cell_size * 0.5,
            node_distance: 0.0,
        }
    }

    /// Required clear square, in cells. The offset is re-centred on it.
    #[must_use]
    pub fn with_clearance(mut self, cells: i32) -> Self {
        self.clearance = cells.max(1);
        self.offset = self.clearance as f32 * self.footprint.cell_size * 0.5;
        self
    }

    /// Distance of the node from the corner along each axis
    #[must_use]
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    fn is_convex_corner(
        &self,
        open: &dyn OpenCellOracle,
        x: i32,
        z: i32,
        dx: i32,
        dz: i32,
    ) -> bool {
        if !open.is_open_cell(x + dx, z) || !open.is_open_cell(x, z + dz) {
            return false;
        }
        (1..=self.clearance).all(|i| {
            (1..=self.clearance).all(|j| open.is_open_cell(x + dx * i, z + dz * j))
        })
    }
}

impl NodeGenerator for CornerGraphGenerator {
    fn generate(&self, open: &dyn OpenCellOracle, builder: &mut NavGraphBuilder) {
        let before = builder.node_count();
        let half = self.footprint.cell_size * 0.5;

        for (x, z) in self.footprint.cells() {
            if open.is_open_cell(x, z) {
                continue;
            }
            let center = self.footprint.cell_center(x, z);
            for (dx, dz) in DIAGONALS {
                if !self.is_convex_corner(open, x, z, dx, dz) {
                    continue;
                }
                let dir = Vec3::new(dx as f32, 0.0, dz as f32);
                builder.add_node(center + dir * (half + self.offset));
            }
        }

        builder.request_node_distance(self.node_distance);
        log::debug!(
            "Corner generator placed {} nodes",
            builder.node_count() - before
        );
    }

    fn set_node_distance(&mut self, distance: f32) {
        self.node_distance = distance;
    }
}
