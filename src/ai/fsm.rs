//! Finite State Machine for agent brains
//!
//! A generic state machine plus a handful of states that drive movement.
//! States never move the agent themselves: they read a [`BrainContext`] and
//! push [`MovementCommand`]s into it, which the simulation applies to the
//! agent's [`AgentMovement`](super::AgentMovement) before the movement tick.
//!
//! # Example
//!
//! ```ignore
//! let mut brain: Brain = StateMachine::new(TravelState::new(route, true));
//!
//! let mut ctx = BrainContext::new(agent, position, dt, snapshot.clone());
//! brain.update(&mut ctx);
//! for command in ctx.commands { movement.apply(command, &service, position); }
//! ```

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;

use super::agent::{MovementCommand, PositionSnapshot, TargetRegistry};
use super::steering::Behaviour;
use crate::core::NavigationEvent;

// ============================================================================
// State Trait
// ============================================================================

/// A state in the finite state machine.
///
/// The lifecycle is:
///
/// 1. `enter()` - Called once when entering this state
/// 2. `update()` - Called each tick while in this state
/// 3. `exit()` - Called once when leaving this state
///
/// States are `Send + Sync` so a machine can live in a `hecs` component.
pub trait State<Ctx = ()>: fmt::Debug + Send + Sync {
    /// State name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Called when entering this state.
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called each tick while in this state.
    ///
    /// Returns a `Transition` to indicate whether to stay or change states.
    fn update(&mut self, ctx: &mut Ctx) -> Transition<Ctx>;

    /// Called when exiting this state.
    fn exit(&mut self, _ctx: &mut Ctx) {}
}

// ============================================================================
// Transition
// ============================================================================

/// Represents a state transition decision.
pub enum Transition<Ctx = ()> {
    /// Stay in the current state.
    None,
    /// Transition to a new state.
    To(Box<dyn State<Ctx>>),
}

impl<Ctx> Transition<Ctx> {
    /// Create a transition to a new state.
    pub fn to<S: State<Ctx> + 'static>(state: S) -> Self {
        Transition::To(Box::new(state))
    }
}

impl<Ctx> fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => write!(f, "Transition::None"),
            Transition::To(state) => write!(f, "Transition::To({})", state.name()),
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// A finite state machine that manages state transitions.
///
/// # Type Parameters
///
/// - `Ctx`: Context type passed to state methods
pub struct StateMachine<Ctx = ()> {
    /// Current active state
    current: Box<dyn State<Ctx>>,
    /// Whether enter() has been called on current state
    entered: bool,
}

impl<Ctx> StateMachine<Ctx> {
    /// Create a new state machine with an initial state.
    ///
    /// The initial state's `enter()` will be called on the first `update()`.
    pub fn new<S: State<Ctx> + 'static>(initial: S) -> Self {
        Self {
            current: Box::new(initial),
            entered: false,
        }
    }

    /// Update the state machine.
    ///
    /// Calls `enter()` on first update, then `update()` each tick.
    /// Handles transitions by calling `exit()` on old state and `enter()` on new.
    pub fn update(&mut self, ctx: &mut Ctx) {
        if !self.entered {
            self.current.enter(ctx);
            self.entered = true;
        }

        if let Transition::To(mut new_state) = self.current.update(ctx) {
            log::debug!(
                "Brain transition {} -> {}",
                self.current.name(),
                new_state.name()
            );
            self.current.exit(ctx);
            new_state.enter(ctx);
            self.current = new_state;
        }
    }

    /// Force a transition to a new state.
    ///
    /// Immediately exits the current state and enters the new one.
    pub fn transition<S: State<Ctx> + 'static>(&mut self, ctx: &mut Ctx, new_state: S) {
        if self.entered {
            self.current.exit(ctx);
        }

        self.current = Box::new(new_state);
        self.current.enter(ctx);
        self.entered = true;
    }

    /// Get the name of the current state.
    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        self.current.name()
    }

    /// Check if the FSM is in a state with the given name.
    #[must_use]
    pub fn is_in_state(&self, name: &str) -> bool {
        self.current.name() == name
    }
}

impl<Ctx> fmt::Debug for StateMachine<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current.name())
            .field("entered", &self.entered)
            .finish()
    }
}

// ============================================================================
// Brain
// ============================================================================

/// What a brain sees for one agent on one tick.
#[derive(Debug)]
pub struct BrainContext {
    /// The agent being thought for
    pub agent: Entity,
    /// Its position at the start of the tick
    pub position: Vec3,
    /// Tick length in seconds
    pub delta_time: f32,
    /// Positions of every entity at the start of the tick
    pub targets: Arc<PositionSnapshot>,
    /// This agent's movement events from the previous tick
    pub events: Vec<NavigationEvent>,
    /// Commands issued this tick, applied in order
    pub commands: Vec<MovementCommand>,
}

impl BrainContext {
    /// Context with no events and no commands
    #[must_use]
    pub fn new(
        agent: Entity,
        position: Vec3,
        delta_time: f32,
        targets: Arc<PositionSnapshot>,
    ) -> Self {
        Self {
            agent,
            position,
            delta_time,
            targets,
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Attach last tick's events
    #[must_use]
    pub fn with_events(mut self, events: Vec<NavigationEvent>) -> Self {
        self.events = events;
        self
    }

    /// Issue a movement command
    pub fn command(&mut self, command: MovementCommand) {
        self.commands.push(command);
    }

    /// Whether the agent finished its path last tick
    #[must_use]
    pub fn arrived(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, NavigationEvent::PathCompleted { .. }))
    }

    /// Whether `target` went missing last tick
    #[must_use]
    pub fn lost(&self, target: Entity) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, NavigationEvent::TargetLost { target: t, .. } if *t == target))
            || self.targets.position_of(target).is_none()
    }

    /// Whether a request with `behaviour` completed last tick
    #[must_use]
    pub fn completed(&self, behaviour: Behaviour) -> bool {
        self.events.iter().any(|e| {
            matches!(e, NavigationEvent::RequestCompleted { behaviour: b, .. } if *b == behaviour)
        })
    }

    /// Distance to another entity, if it still exists
    #[must_use]
    pub fn distance_to(&self, target: Entity) -> Option<f32> {
        self.targets
            .position_of(target)
            .map(|p| p.distance(self.position))
    }
}

/// A state machine driving one agent's movement.
pub type Brain = StateMachine<BrainContext>;

/// Standing still.
#[derive(Debug, Default)]
pub struct IdleState {
    /// Time spent idle
    pub idle_time: f32,
    /// Idle time before wandering off (zero or less = idle forever)
    pub max_idle_time: f32,
}

impl IdleState {
    /// Idle, then wander after `max_idle_time` seconds.
    #[must_use]
    pub fn new(max_idle_time: f32) -> Self {
        Self {
            idle_time: 0.0,
            max_idle_time,
        }
    }
}

impl State<BrainContext> for IdleState {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn enter(&mut self, ctx: &mut BrainContext) {
        self.idle_time = 0.0;
        ctx.command(MovementCommand::Stop);
    }

    fn update(&mut self, ctx: &mut BrainContext) -> Transition<BrainContext> {
        self.idle_time += ctx.delta_time;

        if self.max_idle_time > 0.0 && self.idle_time >= self.max_idle_time {
            return Transition::to(WanderState::default());
        }

        Transition::None
    }
}

/// Roaming at random.
#[derive(Debug, Default)]
pub struct WanderState {
    /// Time spent wandering
    pub wander_time: f32,
    /// How long to wander before going idle (zero or less = forever)
    pub duration: f32,
}

impl WanderState {
    /// Wander for `duration` seconds, then idle.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            wander_time: 0.0,
            duration,
        }
    }
}

impl State<BrainContext> for WanderState {
    fn name(&self) -> &'static str {
        "Wander"
    }

    fn enter(&mut self, ctx: &mut BrainContext) {
        self.wander_time = 0.0;
        ctx.command(MovementCommand::Wander(true));
    }

    fn update(&mut self, ctx: &mut BrainContext) -> Transition<BrainContext> {
        self.wander_time += ctx.delta_time;

        if self.duration > 0.0 && self.wander_time >= self.duration {
            return Transition::to(IdleState::default());
        }

        Transition::None
    }

    fn exit(&mut self, ctx: &mut BrainContext) {
        ctx.command(MovementCommand::Wander(false));
    }
}

/// Navigating through a list of goals in order.
#[derive(Debug, Default)]
pub struct TravelState {
    /// Goals to visit
    pub route: Vec<Vec3>,
    /// Index of the goal being travelled to
    pub index: usize,
    /// Start over after the last goal
    pub looping: bool,
}

impl TravelState {
    /// Travel `route` once, or forever if `looping`.
    #[must_use]
    pub fn new(route: Vec<Vec3>, looping: bool) -> Self {
        Self {
            route,
            index: 0,
            looping,
        }
    }

    fn goal(&self) -> Option<Vec3> {
        self.route.get(self.index).copied()
    }
}

impl State<BrainContext> for TravelState {
    fn name(&self) -> &'static str {
        "Travel"
    }

    fn enter(&mut self, ctx: &mut BrainContext) {
        if let Some(goal) = self.goal() {
            ctx.command(MovementCommand::Navigate(goal));
        }
    }

    fn update(&mut self, ctx: &mut BrainContext) -> Transition<BrainContext> {
        if self.route.is_empty() {
            return Transition::to(IdleState::default());
        }
        if !ctx.arrived() {
            return Transition::None;
        }

        self.index += 1;
        if self.index >= self.route.len() {
            if !self.looping {
                return Transition::to(IdleState::default());
            }
            self.index = 0;
        }
        if let Some(goal) = self.goal() {
            ctx.command(MovementCommand::Navigate(goal));
        }

        Transition::None
    }
}

/// Chasing another entity.
#[derive(Debug)]
pub struct PursueState {
    /// Who is being chased
    pub target: Entity,
}

impl PursueState {
    /// Chase `target`.
    #[must_use]
    pub fn new(target: Entity) -> Self {
        Self { target }
    }
}

impl State<BrainContext> for PursueState {
    fn name(&self) -> &'static str {
        "Pursue"
    }

    fn enter(&mut self, ctx: &mut BrainContext) {
        ctx.command(MovementCommand::Move(Behaviour::Pursue, self.target.into()));
    }

    fn update(&mut self, ctx: &mut BrainContext) -> Transition<BrainContext> {
        if ctx.lost(self.target) || ctx.completed(Behaviour::Pursue) {
            return Transition::to(IdleState::default());
        }

        Transition::None
    }
}

/// Getting away from another entity.
#[derive(Debug)]
pub struct FleeState {
    /// Who is being fled from
    pub threat: Entity,
}

impl FleeState {
    /// Run from `threat`.
    #[must_use]
    pub fn new(threat: Entity) -> Self {
        Self { threat }
    }
}

impl State<BrainContext> for FleeState {
    fn name(&self) -> &'static str {
        "Flee"
    }

    fn enter(&mut self, ctx: &mut BrainContext) {
        ctx.command(MovementCommand::Move(Behaviour::Evade, self.threat.into()));
    }

    fn update(&mut self, ctx: &mut BrainContext) -> Transition<BrainContext> {
        if ctx.lost(self.threat) || ctx.completed(Behaviour::Evade) {
            return Transition::to(IdleState::default());
        }

        Transition::None
    }
}

// ============================================================================
// Tests
// ============================================================================
