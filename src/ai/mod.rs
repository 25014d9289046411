//! AI and movement module
//!
//! Provides steering behaviors, kinematic integration, per-agent movement,
//! and finite state machines that drive it.

mod agent;
mod fsm;
mod kinematic;
mod steering;

pub use agent::{
    AgentMovement, MoveTarget, MovementCommand, MovementRequest, PositionSnapshot, TargetRegistry,
};
pub use fsm::{
    Brain, BrainContext, FleeState, IdleState, PursueState, State, StateMachine, Transition,
    TravelState, WanderState,
};
pub use kinematic::{Kinematic, MovementLimits};
pub use steering::{
    Behaviour, CompletionThresholds, evade, face, flee, from_planar, heading_direction, heading_of,
    is_complete, planar, predict_target, pursue, seek, wander,
};
