//! Core module
//!
//! Configuration, movement events and the simulation loop

mod config;
mod events;
mod simulation;

pub use config::{AgentConfig, ConfigError, NavigationConfig};
pub use events::{EventQueue, NavigationEvent};
pub use simulation::Simulation;
