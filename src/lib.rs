//! Navigation and autonomous movement for game agents
//!
//! This crate provides:
//! - Navigation graphs built from level geometry by pluggable node generators
//! - All-pairs path lookup tables with string pulling, persisted per level
//! - Steering behaviours and acceleration-limited movement
//! - Per-agent movement driven by finite state machine brains
//! - A fixed-step simulation loop over a hecs world

pub mod ai;
pub mod core;
pub mod ecs;
pub mod nav;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentMovement, Behaviour, Brain, BrainContext, MoveTarget, MovementCommand, State,
        StateMachine, Transition,
    };
    pub use crate::core::{AgentConfig, EventQueue, NavigationConfig, NavigationEvent, Simulation};
    pub use crate::ecs::{Name, Transform, Velocity, World};
    pub use crate::nav::{
        CornerGraphGenerator, Footprint, GridGenerator, NavigationService, NavigationStore,
        NodeGenerator, ObstructionOracle, OccupancyGrid, OpenCellOracle,
    };
    pub use glam::{Quat, Vec2, Vec3};
}
