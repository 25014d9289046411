//! Navigation and agent configuration
//!
//! Supports saving and loading configuration in RON (Rusty Object Notation)
//! and JSON formats. Missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Level-wide navigation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Radius line-of-sight tests are inflated by
    pub agent_radius: f32,
    /// Largest vertical difference a string-pull shortcut may span
    pub max_step_height: f32,
    /// Connection distance forced onto every generator (zero or less =
    /// unlimited). `None` keeps each generator's own default.
    pub node_distance: Option<f32>,
    /// Directory persisted lookup tables are kept in
    pub data_directory: PathBuf,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            agent_radius: 0.25,
            max_step_height: 0.5,
            node_distance: None,
            data_directory: PathBuf::from("navdata"),
        }
    }
}

impl NavigationConfig {
    /// Set the agent radius
    #[must_use]
    pub fn with_agent_radius(mut self, radius: f32) -> Self {
        self.agent_radius = radius;
        self
    }

    /// Set the maximum step height
    #[must_use]
    pub fn with_max_step_height(mut self, height: f32) -> Self {
        self.max_step_height = height;
        self
    }

    /// Force a connection distance onto every generator
    #[must_use]
    pub fn with_node_distance(mut self, distance: f32) -> Self {
        self.node_distance = Some(distance);
        self
    }

    /// Set the persisted data directory
    #[must_use]
    pub fn with_data_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.data_directory = directory.into();
        self
    }

    /// Save to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_ron(self, path)
    }

    /// Load from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_ron(path)
    }

    /// Save to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_json(self, path)
    }

    /// Load from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path)
    }
}

/// Per-agent movement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Top speed in units per second
    pub max_speed: f32,
    /// Acceleration in units per second squared (zero = unlimited)
    pub acceleration: f32,
    /// Exponential damping rate when no steering is active (zero = stop
    /// instantly)
    pub deceleration: f32,
    /// Speed below which a damped agent snaps to rest
    pub rest_velocity: f32,
    /// Seek/Pursue complete within this distance (negative = never)
    pub seek_acceptable_distance: f32,
    /// Flee/Evade complete beyond this distance (negative = never)
    pub flee_acceptable_distance: f32,
    /// Largest heading change per wander tick, in degrees
    pub wander_max_turn_degrees: f32,
    /// How far ahead the wander target is projected
    pub wander_look_ahead: f32,
    /// Turn rate when facing the direction of travel
    pub face_degrees_per_second: f32,
    /// Seed for the agent's wander randomness
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            acceleration: 10.0,
            deceleration: 8.0,
            rest_velocity: 0.05,
            seek_acceptable_distance: 0.1,
            flee_acceptable_distance: 10.0,
            wander_max_turn_degrees: 15.0,
            wander_look_ahead: 2.0,
            face_degrees_per_second: 360.0,
            seed: 0,
        }
    }
}

impl AgentConfig {
    /// Set the top speed
    #[must_use]
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }

    /// Set the acceleration (zero = unlimited)
    #[must_use]
    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Set the deceleration rate
    #[must_use]
    pub fn with_deceleration(mut self, deceleration: f32) -> Self {
        self.deceleration = deceleration;
        self
    }

    /// Set the seek and flee completion distances
    #[must_use]
    pub fn with_acceptable_distances(mut self, seek: f32, flee: f32) -> Self {
        self.seek_acceptable_distance = seek;
        self.flee_acceptable_distance = flee;
        self
    }

    /// Set the wander seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Save to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_ron(self, path)
    }

    /// Load from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_ron(path)
    }

    /// Save to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        save_json(self, path)
    }

    /// Load from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path)
    }
}

fn save_ron<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let ron_string = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
    Ok(())
}

fn load_ron<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    ron::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
}

fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let json_string = serde_json::to_string_pretty(value)
        .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
}

/// Errors that can occur while reading or writing configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
