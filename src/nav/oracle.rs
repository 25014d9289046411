//! Geometry oracles consumed by the navigation subsystem
//!
//! The navigation code never inspects level geometry directly. It asks two
//! questions: "is this straight segment blocked?" and "is this footprint cell
//! open?". Engines answer them with whatever physics or tile data they have.

use glam::Vec3;

/// Answers line-of-sight queries between two points.
pub trait ObstructionOracle {
    /// Returns `true` if the straight segment from `a` to `b` is blocked.
    ///
    /// `agent_radius` inflates the segment into a capsule; a radius of zero
    /// or less is an infinitely thin ray test.
    fn is_obstructed(&self, a: Vec3, b: Vec3, agent_radius: f32) -> bool;

    /// Convenience inverse of [`ObstructionOracle::is_obstructed`].
    fn has_line_of_sight(&self, a: Vec3, b: Vec3, agent_radius: f32) -> bool {
        !self.is_obstructed(a, b, agent_radius)
    }
}

impl<F> ObstructionOracle for F
where
    F: Fn(Vec3, Vec3, f32) -> bool,
{
    fn is_obstructed(&self, a: Vec3, b: Vec3, agent_radius: f32) -> bool {
        self(a, b, agent_radius)
    }
}

/// Answers whether a cell of the discretised level footprint is navigable.
pub trait OpenCellOracle {
    /// Returns `true` if cell `(x, z)` is open.
    fn is_open_cell(&self, x: i32, z: i32) -> bool;
}

impl<T: OpenCellOracle + ?Sized> OpenCellOracle for &T {
    fn is_open_cell(&self, x: i32, z: i32) -> bool {
        (**self).is_open_cell(x, z)
    }
}

/// An oracle for levels with no obstacles at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl ObstructionOracle for OpenSpace {
    fn is_obstructed(&self, _a: Vec3, _b: Vec3, _agent_radius: f32) -> bool {
        false
    }
}
