//! Agent movement
//!
//! [`AgentMovement`] is the per-agent component that turns what an agent
//! wants (follow a path, a handful of steering requests, or roam) into one
//! velocity per tick. It owns its path, its request set, its wander state
//! and its [`Kinematic`] integrator.
//!
//! Live targets are `hecs::Entity` ids. They are never owned here: each tick
//! they are resolved through a [`TargetRegistry`], and a request whose
//! target no longer resolves is dropped.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use hecs::Entity;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::kinematic::{Kinematic, MovementLimits};
use super::steering::{
    Behaviour, CompletionThresholds, evade, flee, from_planar, heading_direction, is_complete,
    planar, pursue, seek, wander,
};
use crate::core::{AgentConfig, EventQueue, NavigationEvent};
use crate::nav::{NavigationService, ObstructionOracle};

/// Path waypoints closer than this are consumed even when the seek
/// threshold is disabled.
const WAYPOINT_EPSILON: f32 = 1e-3;

// ============================================================================
// Targets
// ============================================================================

/// Resolves live targets to positions.
pub trait TargetRegistry {
    /// Current position of `entity`, or `None` if it no longer exists.
    fn position_of(&self, entity: Entity) -> Option<Vec3>;
}

/// Positions of every entity at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct PositionSnapshot {
    positions: FxHashMap<Entity, Vec3>,
}

impl PositionSnapshot {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position
    pub fn insert(&mut self, entity: Entity, position: Vec3) {
        self.positions.insert(entity, position);
    }

    /// Forget an entity
    pub fn remove(&mut self, entity: Entity) {
        self.positions.remove(&entity);
    }

    /// Number of recorded entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<(Entity, Vec3)> for PositionSnapshot {
    fn from_iter<I: IntoIterator<Item = (Entity, Vec3)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl TargetRegistry for PositionSnapshot {
    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.positions.get(&entity).copied()
    }
}

// ============================================================================
// Movement requests
// ============================================================================

/// What a movement request steers relative to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTarget {
    /// A fixed planar point (x, z)
    Position(Vec2),
    /// Another entity, resolved each tick
    Entity(Entity),
}

impl From<Vec3> for MoveTarget {
    fn from(position: Vec3) -> Self {
        Self::Position(planar(position))
    }
}

impl From<Entity> for MoveTarget {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

/// One steering behaviour against one target.
#[derive(Debug, Clone, Copy)]
pub struct MovementRequest {
    behaviour: Behaviour,
    target: MoveTarget,
    last_target: Option<Vec2>,
}

impl MovementRequest {
    /// New request. Pursue and Evade against a fixed point become Seek and
    /// Flee.
    #[must_use]
    pub fn new(behaviour: Behaviour, target: impl Into<MoveTarget>) -> Self {
        let target = target.into();
        let behaviour = match target {
            MoveTarget::Position(_) => behaviour.for_static_target(),
            MoveTarget::Entity(_) => behaviour,
        };
        Self {
            behaviour,
            target,
            last_target: None,
        }
    }

    /// Behaviour after static-target degradation
    #[must_use]
    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    /// Target
    #[must_use]
    pub fn target(&self) -> MoveTarget {
        self.target
    }

    /// Same behaviour against the same target
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.behaviour == other.behaviour && self.target == other.target
    }
}

/// A change to an agent's movement, issued by its brain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementCommand {
    /// Follow a path to a point
    Navigate(Vec3),
    /// Replace all requests with one
    Move(Behaviour, MoveTarget),
    /// Add a request alongside the current ones
    AddMove(Behaviour, MoveTarget),
    /// Turn wander on or off
    Wander(bool),
    /// Drop everything
    Stop,
}

// ============================================================================
// Agent movement
// ============================================================================

/// Per-agent movement state.
#[derive(Debug, Clone)]
pub struct AgentMovement {
    requests: SmallVec<[MovementRequest; 4]>,
    path: VecDeque<Vec3>,
    destination: Option<Vec3>,
    wandering: bool,
    heading: f32,
    wander_max_turn: f32,
    wander_look_ahead: f32,
    face_degrees_per_second: f32,
    thresholds: CompletionThresholds,
    kinematic: Kinematic,
    rng: StdRng,
}

impl Default for AgentMovement {
    fn default() -> Self {
        Self::new(&AgentConfig::default())
    }
}

impl AgentMovement {
    /// Idle agent configured from `config`
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            requests: SmallVec::new(),
            path: VecDeque::new(),
            destination: None,
            wandering: false,
            heading: 0.0,
            wander_max_turn: config.wander_max_turn_degrees,
            wander_look_ahead: config.wander_look_ahead,
            face_degrees_per_second: config.face_degrees_per_second,
            thresholds: CompletionThresholds {
                seek_acceptable_distance: config.seek_acceptable_distance,
                flee_acceptable_distance: config.flee_acceptable_distance,
            },
            kinematic: Kinematic::new(MovementLimits::from(config)),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Start wander heading, in degrees
    #[must_use]
    pub fn with_heading(mut self, heading_degrees: f32) -> Self {
        self.heading = heading_degrees;
        self
    }

    /// Active steering requests
    #[must_use]
    pub fn requests(&self) -> &[MovementRequest] {
        &self.requests
    }

    /// Remaining waypoints
    #[must_use]
    pub fn path(&self) -> &VecDeque<Vec3> {
        &self.path
    }

    /// Goal of the path being followed
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Whether a path is being followed
    #[must_use]
    pub fn is_navigating(&self) -> bool {
        self.destination.is_some()
    }

    /// Whether wander is on
    #[must_use]
    pub fn is_wandering(&self) -> bool {
        self.wandering
    }

    /// Current wander heading in degrees
    #[must_use]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Whether there is nothing to do
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.requests.is_empty() && self.path.is_empty() && !self.wandering
    }

    /// Velocity from the last tick
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.kinematic.velocity()
    }

    /// Turn rate for facing the direction of travel
    #[must_use]
    pub fn face_degrees_per_second(&self) -> f32 {
        self.face_degrees_per_second
    }

    /// Completion thresholds
    #[must_use]
    pub fn thresholds(&self) -> &CompletionThresholds {
        &self.thresholds
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.destination = None;
    }

    /// Replace everything the agent is doing with a single request.
    pub fn move_to(&mut self, behaviour: Behaviour, target: impl Into<MoveTarget>) {
        self.clear_path();
        self.requests.clear();
        self.requests.push(MovementRequest::new(behaviour, target));
    }

    /// Add a request alongside the current ones.
    ///
    /// Returns `false` if an identical request is already active. Any path
    /// being followed is dropped.
    pub fn add_move(&mut self, behaviour: Behaviour, target: impl Into<MoveTarget>) -> bool {
        let request = MovementRequest::new(behaviour, target);
        if self.requests.iter().any(|r| r.same_as(&request)) {
            return false;
        }
        self.clear_path();
        self.requests.push(request);
        true
    }

    /// Follow a path from `position` to `goal`.
    ///
    /// Returns `false` (and changes nothing) if already navigating to
    /// `goal`. Otherwise replaces all requests with the path.
    pub fn navigate<O: ObstructionOracle>(
        &mut self,
        service: &NavigationService<O>,
        position: Vec3,
        goal: Vec3,
    ) -> bool {
        if self.destination == Some(goal) {
            return false;
        }

        self.requests.clear();
        self.path = service.lookup_path(position, goal).into();
        self.destination = Some(goal);
        log::debug!(
            "Navigating from {} to {} via {} waypoints",
            position,
            goal,
            self.path.len()
        );
        true
    }

    /// Turn wander on or off.
    pub fn set_wander(&mut self, enabled: bool) {
        self.wandering = enabled;
    }

    /// Drop every request, the path, and wander. Velocity then damps out.
    pub fn stop(&mut self) {
        self.requests.clear();
        self.clear_path();
        self.wandering = false;
    }

    /// Apply a brain command.
    ///
    /// Returns `true` if a new path was assigned.
    pub fn apply<O: ObstructionOracle>(
        &mut self,
        command: MovementCommand,
        service: &NavigationService<O>,
        position: Vec3,
    ) -> bool {
        match command {
            MovementCommand::Navigate(goal) => return self.navigate(service, position, goal),
            MovementCommand::Move(behaviour, target) => self.move_to(behaviour, target),
            MovementCommand::AddMove(behaviour, target) => {
                self.add_move(behaviour, target);
            }
            MovementCommand::Wander(enabled) => self.set_wander(enabled),
            MovementCommand::Stop => self.stop(),
        }
        false
    }

    fn waypoint_reached(&self, position: Vec2, waypoint: Vec3) -> bool {
        position.distance(planar(waypoint)) <= WAYPOINT_EPSILON
            || is_complete(Behaviour::Seek, position, planar(waypoint), &self.thresholds)
    }

    /// Advance one tick and return the new planar velocity.
    ///
    /// Path following takes precedence over steering requests. Completed
    /// requests and requests whose target vanished are removed, and events
    /// are pushed for them.
    pub fn tick<R: TargetRegistry + ?Sized>(
        &mut self,
        agent: Entity,
        position: Vec3,
        targets: &R,
        delta_time: f32,
        events: &mut EventQueue,
    ) -> Vec2 {
        let here = planar(position);
        let velocity = self.kinematic.velocity();
        let magnitude = self.kinematic.limits().steering_magnitude();
        let mut steering = Vec2::ZERO;

        if let Some(goal) = self.destination {
            while self
                .path
                .front()
                .is_some_and(|&waypoint| self.waypoint_reached(here, waypoint))
            {
                self.path.pop_front();
            }

            match self.path.front() {
                Some(&waypoint) => {
                    steering += seek(here, velocity, planar(waypoint), magnitude);
                }
                None => {
                    self.destination = None;
                    events.push(NavigationEvent::PathCompleted { agent, goal });
                }
            }
        } else {
            steering +=
                self.steer_requests(agent, here, velocity, magnitude, targets, delta_time, events);
        }

        if self.wandering && self.destination.is_none() {
            self.heading = wander(self.heading, self.wander_max_turn, &mut self.rng);
            let ahead = here + heading_direction(self.heading) * self.wander_look_ahead;
            steering += seek(here, velocity, ahead, magnitude);
        }

        self.kinematic.integrate(steering, delta_time)
    }

    #[allow(clippy::too_many_arguments)]
    fn steer_requests<R: TargetRegistry + ?Sized>(
        &mut self,
        agent: Entity,
        here: Vec2,
        velocity: Vec2,
        magnitude: f32,
        targets: &R,
        delta_time: f32,
        events: &mut EventQueue,
    ) -> Vec2 {
        let thresholds = self.thresholds;
        let mut steering = Vec2::ZERO;

        self.requests.retain(|request| {
            let target = match request.target {
                MoveTarget::Position(point) => point,
                MoveTarget::Entity(entity) => match targets.position_of(entity) {
                    Some(position) => planar(position),
                    None => {
                        log::warn!("Movement target {:?} vanished, dropping request", entity);
                        events.push(NavigationEvent::TargetLost {
                            agent,
                            target: entity,
                        });
                        return false;
                    }
                },
            };

            if is_complete(request.behaviour, here, target, &thresholds) {
                events.push(NavigationEvent::RequestCompleted {
                    agent,
                    behaviour: request.behaviour,
                });
                return false;
            }

            let last = request.last_target.unwrap_or(target);
            steering += match request.behaviour {
                Behaviour::Seek => seek(here, velocity, target, magnitude),
                Behaviour::Flee => flee(here, velocity, target, magnitude),
                Behaviour::Pursue => pursue(here, velocity, target, last, magnitude, delta_time),
                Behaviour::Evade => evade(here, velocity, target, last, magnitude, delta_time),
            };
            request.last_target = Some(target);
            true
        });

        steering
    }

    /// World-space velocity for the last tick, at zero height
    #[must_use]
    pub fn world_velocity(&self) -> Vec3 {
        from_planar(self.kinematic.velocity(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NavigationConfig;
    use crate::nav::OpenSpace;

    fn config() -> AgentConfig {
        AgentConfig::default()
            .with_max_speed(2.0)
            .with_acceleration(0.0)
            .with_deceleration(0.0)
            .with_seed(3)
    }

    /// Step an agent along its velocity for up to `ticks` ticks.
    fn run(
        movement: &mut AgentMovement,
        agent: Entity,
        mut position: Vec3,
        targets: &PositionSnapshot,
        events: &mut EventQueue,
        ticks: usize,
    ) -> Vec3 {
        let dt = 1.0 / 60.0;
        for _ in 0..ticks {
            movement.tick(agent, position, targets, dt, events);
            position += movement.world_velocity() * dt;
        }
        position
    }

    #[test]
    fn test_pursue_fixed_point_degrades_to_seek() {
        let request = MovementRequest::new(Behaviour::Pursue, Vec3::X);
        assert_eq!(request.behaviour(), Behaviour::Seek);

        let request = MovementRequest::new(Behaviour::Evade, Vec3::X);
        assert_eq!(request.behaviour(), Behaviour::Flee);
    }

    #[test]
    fn test_add_move_suppresses_duplicates() {
        let mut movement = AgentMovement::new(&config());
        assert!(movement.add_move(Behaviour::Seek, Vec3::new(1.0, 0.0, 2.0)));
        assert!(!movement.add_move(Behaviour::Seek, Vec3::new(1.0, 0.0, 2.0)));
        // Pursue of a fixed point is a Seek, so it is a duplicate as well.
        assert!(!movement.add_move(Behaviour::Pursue, Vec3::new(1.0, 0.0, 2.0)));
        assert!(movement.add_move(Behaviour::Flee, Vec3::new(1.0, 0.0, 2.0)));
        assert_eq!(movement.requests().len(), 2);
    }

    #[test]
    fn test_seek_within_threshold_completes_immediately() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let mut movement = AgentMovement::new(&config());
        let mut events = EventQueue::new();

        // Target directly behind the agent, 0.05 away.
        movement.move_to(Behaviour::Seek, Vec3::new(0.0, 0.0, 0.05));
        let targets = PositionSnapshot::new();
        let velocity = movement.tick(agent, Vec3::ZERO, &targets, 0.016, &mut events);

        assert_eq!(velocity, Vec2::ZERO);
        assert!(movement.requests().is_empty());
        events.swap();
        assert!(matches!(
            events.iter().next(),
            Some(NavigationEvent::RequestCompleted {
                behaviour: Behaviour::Seek,
                ..
            })
        ));
    }

    #[test]
    fn test_seek_reaches_point() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let mut movement = AgentMovement::new(&config());
        let mut events = EventQueue::new();
        let goal = Vec3::new(3.0, 0.0, -2.0);

        movement.move_to(Behaviour::Seek, goal);
        let end = run(&mut movement, agent, Vec3::ZERO, &PositionSnapshot::new(), &mut events, 300);

        assert!(end.distance(goal) <= 0.1 + 1e-3);
        assert!(movement.requests().is_empty());
    }

    #[test]
    fn test_vanished_target_drops_request() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let prey = world.spawn(());
        let mut movement = AgentMovement::new(&config());
        let mut events = EventQueue::new();

        let mut targets = PositionSnapshot::new();
        targets.insert(prey, Vec3::new(5.0, 0.0, 0.0));
        movement.move_to(Behaviour::Pursue, prey);

        let velocity = movement.tick(agent, Vec3::ZERO, &targets, 0.016, &mut events);
        assert!(velocity.x > 0.0);
        assert_eq!(movement.world_velocity(), Vec3::new(velocity.x, 0.0, velocity.y));
        assert_eq!(movement.requests()[0].behaviour(), Behaviour::Pursue);

        targets.remove(prey);
        movement.tick(agent, Vec3::ZERO, &targets, 0.016, &mut events);
        assert!(movement.requests().is_empty());

        events.swap();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, NavigationEvent::TargetLost { target, .. } if *target == prey))
        );
    }

    #[test]
    fn test_navigate_is_idempotent() {
        let service = NavigationService::new(OpenSpace, NavigationConfig::default());
        let mut movement = AgentMovement::new(&config());
        let goal = Vec3::new(4.0, 0.0, 4.0);

        assert!(movement.navigate(&service, Vec3::ZERO, goal));
        assert!(!movement.navigate(&service, Vec3::ZERO, goal));
        assert!(movement.navigate(&service, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_follows_path_to_completion() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let service = NavigationService::new(OpenSpace, NavigationConfig::default());
        let mut movement = AgentMovement::new(&config());
        let mut events = EventQueue::new();
        let goal = Vec3::new(2.0, 0.0, 1.0);

        movement.navigate(&service, Vec3::ZERO, goal);
        let end = run(&mut movement, agent, Vec3::ZERO, &PositionSnapshot::new(), &mut events, 240);

        assert!(!movement.is_navigating());
        assert!(end.distance(goal) <= 0.1 + 1e-3);
        events.swap();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, NavigationEvent::PathCompleted { .. }))
        );
    }

    #[test]
    fn test_move_to_discards_path() {
        let service = NavigationService::new(OpenSpace, NavigationConfig::default());
        let mut movement = AgentMovement::new(&config());

        movement.navigate(&service, Vec3::ZERO, Vec3::new(4.0, 0.0, 4.0));
        movement.move_to(Behaviour::Flee, Vec3::ONE);

        assert!(movement.path().is_empty());
        assert!(!movement.is_navigating());
        assert_eq!(movement.requests().len(), 1);
    }

    #[test]
    fn test_apply_commands() {
        let service = NavigationService::new(OpenSpace, NavigationConfig::default());
        let mut movement = AgentMovement::new(&config());
        let goal = Vec3::new(3.0, 0.0, 0.0);

        assert!(movement.apply(MovementCommand::Navigate(goal), &service, Vec3::ZERO));
        assert!(!movement.apply(MovementCommand::Navigate(goal), &service, Vec3::ZERO));

        movement.apply(MovementCommand::Wander(true), &service, Vec3::ZERO);
        assert!(movement.is_wandering());

        movement.apply(MovementCommand::Stop, &service, Vec3::ZERO);
        assert!(movement.is_idle());
    }

    #[test]
    fn test_wander_is_reproducible() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let targets = PositionSnapshot::new();

        let mut a = AgentMovement::new(&config());
        let mut b = AgentMovement::new(&config());
        a.set_wander(true);
        b.set_wander(true);

        let mut events = EventQueue::new();
        let end_a = run(&mut a, agent, Vec3::ZERO, &targets, &mut events, 120);
        let end_b = run(&mut b, agent, Vec3::ZERO, &targets, &mut events, 120);

        assert_eq!(end_a, end_b);
        assert_ne!(end_a, Vec3::ZERO);
    }

    #[test]
    fn test_stop_damps_to_rest() {
        let mut world = hecs::World::new();
        let agent = world.spawn(());
        let mut movement = AgentMovement::new(&AgentConfig::default());
        let mut events = EventQueue::new();
        let targets = PositionSnapshot::new();

        movement.move_to(Behaviour::Seek, Vec3::new(100.0, 0.0, 0.0));
        run(&mut movement, agent, Vec3::ZERO, &targets, &mut events, 30);
        assert!(movement.velocity().length() > 0.0);

        movement.stop();
        assert!(movement.is_idle());
        run(&mut movement, agent, Vec3::ZERO, &targets, &mut events, 120);
        assert_eq!(movement.velocity(), Vec2::ZERO);
    }
}
