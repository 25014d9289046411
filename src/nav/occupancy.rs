//! Occupancy grid level footprint
//!
//! A uniform grid of open/blocked cells on the XZ plane. It implements both
//! navigation oracles, so tile-based levels and tests can build graphs and
//! answer line-of-sight queries without a physics engine.

use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};
use rustc_hash::FxHasher;

use super::oracle::{ObstructionOracle, OpenCellOracle};

/// A 2D occupancy grid laid on the XZ plane.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    /// Width in cells (X axis)
    pub width: usize,
    /// Depth in cells (Z axis)
    pub depth: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// World XZ position of the corner of cell (0, 0)
    pub origin: Vec2,
    /// Height of the walkable floor
    pub floor_height: f32,
    /// Open cells (true = open)
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Create a new grid (all cells open by default)
    #[must_use]
    pub fn new(width: usize, depth: usize, cell_size: f32) -> Self {
        Self {
            width,
            depth,
            cell_size,
            origin: Vec2::ZERO,
            floor_height: 0.0,
            cells: vec![true; width * depth],
        }
    }

    /// Build a grid from text rows, `#` marking a blocked cell.
    ///
    /// Row `i` of the input becomes `z = i`; every other character is open.
    #[must_use]
    pub fn from_rows(rows: &[&str], cell_size: f32) -> Self {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, rows.len(), cell_size);
        for (z, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                grid.set_open(x, z, c != '#');
            }
        }
        grid
    }

    /// Set a cell's openness
    pub fn set_open(&mut self, x: usize, z: usize, open: bool) {
        if x < self.width && z < self.depth {
            self.cells[z * self.width + x] = open;
        }
    }

    /// Check if a cell is open. Cells outside the grid are closed.
    #[must_use]
    pub fn is_open(&self, x: i32, z: i32) -> bool {
        if x < 0 || z < 0 {
            return false;
        }
        let (x, z) = (x as usize, z as usize);
        if x >= self.width || z >= self.depth {
            return false;
        }
        self.cells[z * self.width + x]
    }

    /// Number of open cells
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|open| **open).count()
    }

    /// Convert world position to grid coordinates
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec3) -> (i32, i32) {
        let local = Vec2::new(pos.x, pos.z) - self.origin;
        (
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    /// Convert grid coordinates to world position (center of cell, on the floor)
    #[must_use]
    pub fn grid_to_world(&self, x: i32, z: i32) -> Vec3 {
        Vec3::new(
            self.origin.x + (x as f32 + 0.5) * self.cell_size,
            self.floor_height,
            self.origin.y + (z as f32 + 0.5) * self.cell_size,
        )
    }

    /// Hash of the layout, used to detect stale persisted navigation data.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.width.hash(&mut hasher);
        self.depth.hash(&mut hasher);
        self.cell_size.to_bits().hash(&mut hasher);
        self.origin.x.to_bits().hash(&mut hasher);
        self.origin.y.to_bits().hash(&mut hasher);
        self.floor_height.to_bits().hash(&mut hasher);
        self.cells.hash(&mut hasher);
        hasher.finish()
    }

    /// Whether a local-space point (relative to `origin`) touches a closed
    /// cell within `radius`.
    fn point_blocked(&self, local: Vec2, radius: f32) -> bool {
        let cs = self.cell_size;
        if radius <= 0.0 {
            let x = (local.x / cs).floor() as i32;
            let z = (local.y / cs).floor() as i32;
            return !self.is_open(x, z);
        }

        let min_x = ((local.x - radius) / cs).floor() as i32;
        let max_x = ((local.x + radius) / cs).floor() as i32;
        let min_z = ((local.y - radius) / cs).floor() as i32;
        let max_z = ((local.y + radius) / cs).floor() as i32;
        let radius_sq = radius * radius;

        for z in min_z..=max_z {
            for x in min_x..=max_x {
                if self.is_open(x, z) {
                    continue;
                }
                let lo = Vec2::new(x as f32 * cs, z as f32 * cs);
                let hi = lo + Vec2::splat(cs);
                let closest = local.clamp(lo, hi);
                if closest.distance_squared(local) < radius_sq {
                    return true;
                }
            }
        }
        false
    }
}

impl ObstructionOracle for OccupancyGrid {
    fn is_obstructed(&self, a: Vec3, b: Vec3, agent_radius: f32) -> bool {
        let start = Vec2::new(a.x, a.z) - self.origin;
        let end = Vec2::new(b.x, b.z) - self.origin;

        // Quarter-cell sampling is fine enough that a ray cannot skip a cell.
        let step = self.cell_size * 0.25;
        let samples = ((end - start).length() / step).ceil().max(1.0) as usize;

        (0..=samples).any(|i| {
            let t = i as f32 / samples as f32;
            self.point_blocked(start.lerp(end, t), agent_radius)
        })
    }
}

impl OpenCellOracle for OccupancyGrid {
    fn is_open_cell(&self, x: i32, z: i32) -> bool {
        self.is_open(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(10, 10, 1.0);
        // Create a wall
        for z in 2..8 {
            grid.set_open(5, z, false);
        }
        grid
    }

    #[test]
    fn test_out_of_bounds_is_closed() {
        let grid = OccupancyGrid::new(4, 4, 1.0);
        assert!(grid.is_open(0, 0));
        assert!(!grid.is_open(-1, 0));
        assert!(!grid.is_open(4, 0));
    }

    #[test]
    fn test_world_grid_conversion() {
        let grid = OccupancyGrid::new(10, 10, 2.0);
        let world = grid.grid_to_world(3, 4);
        assert_eq!(world, Vec3::new(7.0, 0.0, 9.0));
        assert_eq!(grid.world_to_grid(world), (3, 4));
    }

    #[test]
    fn test_from_rows() {
        let grid = OccupancyGrid::from_rows(&["..#", "#..", "..."], 1.0);
        assert_eq!(grid.width, 3);
        assert_eq!(grid.depth, 3);
        assert!(!grid.is_open(2, 0));
        assert!(!grid.is_open(0, 1));
        assert_eq!(grid.open_count(), 7);
    }

    #[test]
    fn test_ray_blocked_by_wall() {
        let grid = walled();
        let a = grid.grid_to_world(2, 5);
        let b = grid.grid_to_world(8, 5);
        assert!(grid.is_obstructed(a, b, 0.0));
    }

    #[test]
    fn test_ray_passes_around_wall() {
        let grid = walled();
        let a = grid.grid_to_world(2, 0);
        let b = grid.grid_to_world(8, 0);
        assert!(!grid.is_obstructed(a, b, 0.0));
    }

    #[test]
    fn test_radius_inflates_segment() {
        let grid = walled();
        // Passes half a cell above the wall's top end at z = 1.5
        let a = Vec3::new(2.0, 0.0, 1.5);
        let b = Vec3::new(8.0, 0.0, 1.5);
        assert!(!grid.is_obstructed(a, b, 0.0));
        assert!(!grid.is_obstructed(a, b, 0.4));
        assert!(grid.is_obstructed(a, b, 0.6));
    }

    #[test]
    fn test_fingerprint_tracks_layout() {
        let open = OccupancyGrid::new(10, 10, 1.0);
        assert_ne!(open.fingerprint(), walled().fingerprint());
        assert_eq!(walled().fingerprint(), walled().fingerprint());
    }
}
