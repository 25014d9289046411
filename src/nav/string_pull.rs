//! String pulling
//!
//! Greedy removal of redundant waypoints: whenever a waypoint can see a
//! later one directly, everything in between goes. The pass is not globally
//! optimal and is order-sensitive, which is why path queries pull both
//! directions and keep the shorter result.

use glam::Vec3;

use super::oracle::ObstructionOracle;

/// Parameters for a string-pulling pass.
#[derive(Debug, Clone, Copy)]
pub struct StringPullSettings {
    /// Largest vertical difference a shortcut may span
    pub max_step_height: f32,
    /// Radius the line-of-sight test is inflated by
    pub agent_radius: f32,
}

impl Default for StringPullSettings {
    fn default() -> Self {
        Self {
            max_step_height: 0.5,
            agent_radius: 0.0,
        }
    }
}

/// Shortcut `path` in place.
///
/// For every waypoint `i` and every later waypoint `j >= i + 2`, if the two
/// are within `max_step_height` vertically and have a clear line of sight,
/// the waypoints strictly between them are removed and the scan continues
/// from `i`. Endpoints are never removed.
pub fn string_pull<O>(path: &mut Vec<Vec3>, oracle: &O, settings: &StringPullSettings)
where
    O: ObstructionOracle + ?Sized,
{
    let mut i = 0;
    while i + 2 < path.len() {
        let mut j = i + 2;
        while j < path.len() {
            let (from, to) = (path[i], path[j]);
            let step_ok = (from.y - to.y).abs() <= settings.max_step_height;
            if step_ok && !oracle.is_obstructed(from, to, settings.agent_radius) {
                path.drain(i + 1..j);
                j = i + 2;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}

/// Pulled copy of `path`.
#[must_use]
pub fn pulled<O>(path: &[Vec3], oracle: &O, settings: &StringPullSettings) -> Vec<Vec3>
where
    O: ObstructionOracle + ?Sized,
{
    let mut out = path.to_vec();
    string_pull(&mut out, oracle, settings);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{OccupancyGrid, OpenSpace, path_length};

    fn zigzag() -> Vec<Vec3> {
        vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 1.0),
            Vec3::new(4.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_open_space_collapses_to_endpoints() {
        let mut path = zigzag();
        string_pull(&mut path, &OpenSpace, &StringPullSettings::default());
        assert_eq!(path, vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_short_paths_untouched() {
        let mut path = vec![Vec3::ZERO, Vec3::X];
        string_pull(&mut path, &OpenSpace, &StringPullSettings::default());
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_step_height_blocks_shortcut() {
        let mut path = vec![Vec3::ZERO, Vec3::new(1.0, 0.3, 0.0), Vec3::new(2.0, 1.0, 0.0)];
        string_pull(&mut path, &OpenSpace, &StringPullSettings::default());
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_keeps_corner_around_wall() {
        let grid = OccupancyGrid::from_rows(&["....", ".##.", ".##.", "...."], 1.0);
        let around = vec![
            grid.grid_to_world(0, 1),
            grid.grid_to_world(0, 0),
            grid.grid_to_world(1, 0),
            grid.grid_to_world(2, 0),
            grid.grid_to_world(3, 0),
            grid.grid_to_world(3, 1),
            grid.grid_to_world(3, 2),
        ];
        let pulled_path = pulled(&around, &grid, &StringPullSettings::default());

        assert!(pulled_path.len() >= 3, "wall forces at least one corner");
        assert!(pulled_path.len() < around.len());
        assert!(path_length(&pulled_path) <= path_length(&around));
    }

    #[test]
    fn test_idempotent() {
        let grid = OccupancyGrid::from_rows(&["......", ".####.", "......"], 1.0);
        let cells = [
            (0, 2),
            (0, 1),
            (0, 0),
            (1, 0),
            (2, 0),
            (3, 0),
            (4, 0),
            (5, 0),
            (5, 1),
            (5, 2),
        ];
        let path: Vec<Vec3> = cells
            .iter()
            .map(|&(x, z)| grid.grid_to_world(x, z))
            .collect();
        let settings = StringPullSettings::default();

        let once = pulled(&path, &grid, &settings);
        let twice = pulled(&once, &grid, &settings);
        assert_eq!(once, twice);
    }
}
