//! Kinematic integrator
//!
//! Turns a summed steering acceleration into a velocity, limited by
//! acceleration and top speed and damped to rest when nothing steers. Never
//! touches position; callers apply the velocity to whatever they move.

use glam::Vec2;

use crate::core::AgentConfig;

/// Speed and acceleration limits for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementLimits {
    /// Top speed
    pub max_speed: f32,
    /// Acceleration (zero or less = unlimited)
    pub acceleration: f32,
    /// Exponential damping rate (zero or less = stop instantly)
    pub deceleration: f32,
    /// Damped speeds below this snap to zero
    pub rest_velocity: f32,
}

impl Default for MovementLimits {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for MovementLimits {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_speed: config.max_speed,
            acceleration: config.acceleration,
            deceleration: config.deceleration,
            rest_velocity: config.rest_velocity,
        }
    }
}

impl MovementLimits {
    /// Whether velocity changes are instant
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.acceleration <= 0.0
    }

    /// Magnitude steering behaviours should be evaluated at.
    ///
    /// With unlimited acceleration the steering output is used directly as
    /// the velocity, so it is computed at top speed.
    #[must_use]
    pub fn steering_magnitude(&self) -> f32 {
        if self.is_unlimited() {
            self.max_speed
        } else {
            self.acceleration
        }
    }
}

/// Per-agent velocity state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kinematic {
    velocity: Vec2,
    limits: MovementLimits,
}

impl Kinematic {
    /// At rest, with the given limits
    #[must_use]
    pub fn new(limits: MovementLimits) -> Self {
        Self {
            velocity: Vec2::ZERO,
            limits,
        }
    }

    /// Current planar velocity
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Limits in use
    #[must_use]
    pub fn limits(&self) -> &MovementLimits {
        &self.limits
    }

    /// Advance by `delta_time` under the summed `steering` acceleration and
    /// return the new velocity.
    pub fn integrate(&mut self, steering: Vec2, delta_time: f32) -> Vec2 {
        let limits = self.limits;

        if steering == Vec2::ZERO {
            self.damp(delta_time);
        } else if limits.is_unlimited() {
            self.velocity = steering;
        } else {
            self.velocity += steering * delta_time;
        }

        self.velocity = self.velocity.clamp_length_max(limits.max_speed.max(0.0));
        self.velocity
    }

    fn damp(&mut self, delta_time: f32) {
        let limits = &self.limits;
        if limits.deceleration <= 0.0 {
            self.velocity = Vec2::ZERO;
            return;
        }

        self.velocity *= (-limits.deceleration * delta_time.max(0.0)).exp();
        if self.velocity.length() < limits.rest_velocity {
            self.velocity = Vec2::ZERO;
        }
    }
}
