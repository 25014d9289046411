//! Simulation loop
//!
//! Owns the entity world, the navigation service and the event queue, and
//! advances them one fixed tick at a time. Each tick:
//!
//! 1. last tick's events become readable
//! 2. every entity position is snapshotted
//! 3. brains run and issue movement commands
//! 4. commands are applied to each agent's movement
//! 5. movement ticks, velocity is applied to position, and the agent turns
//!    to face where it is going

use std::sync::Arc;

use glam::{Vec2, Vec3};
use hecs::Entity;

use super::config::AgentConfig;
use super::events::{EventQueue, NavigationEvent};
use crate::ai::{AgentMovement, Brain, BrainContext, MovementCommand, face};
use crate::ecs::{Name, Transform, Velocity, World};
use crate::nav::{NavigationService, ObstructionOracle};

/// Fixed-step simulation of agents over one level.
pub struct Simulation<O: ObstructionOracle> {
    // Agents live in `world`, which is declared first so it drops before the
    // service they query.
    world: World,
    navigation: NavigationService<O>,
    events: EventQueue,
    ticks: u64,
    elapsed: f32,
}

impl<O: ObstructionOracle> Simulation<O> {
    /// Simulation over an already built or loaded navigation service
    #[must_use]
    pub fn new(navigation: NavigationService<O>) -> Self {
        Self {
            world: World::new(),
            navigation,
            events: EventQueue::new(),
            ticks: 0,
            elapsed: 0.0,
        }
    }

    /// The entity world
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The entity world (mutable)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The navigation service
    #[must_use]
    pub fn navigation(&self) -> &NavigationService<O> {
        &self.navigation
    }

    /// The navigation service (mutable)
    pub fn navigation_mut(&mut self) -> &mut NavigationService<O> {
        &mut self.navigation
    }

    /// Events from the previous tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Ticks run so far
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds so far
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Spawn a moving agent, optionally with a brain.
    pub fn spawn_agent(
        &mut self,
        name: &str,
        position: Vec3,
        config: &AgentConfig,
        brain: Option<Brain>,
    ) -> Entity {
        let mut builder = hecs::EntityBuilder::new();
        builder
            .add(Name::new(name))
            .add(Transform::from_position(position))
            .add(Velocity::default())
            .add(AgentMovement::new(config));
        if let Some(brain) = brain {
            builder.add(brain);
        }
        let entity = self.world.spawn(builder.build());
        log::debug!("Spawned agent '{}' at {}", name, position);
        entity
    }

    /// Spawn a static entity agents can target.
    pub fn spawn_marker(&mut self, name: &str, position: Vec3) -> Entity {
        self.world
            .spawn((Name::new(name), Transform::from_position(position)))
    }

    /// Remove an entity. Requests that target it are dropped on the next tick.
    ///
    /// Returns `false` if it did not exist.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    /// Position of an entity
    #[must_use]
    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform>(entity).ok().map(|t| t.position)
    }

    /// Issue a movement command to an agent directly.
    ///
    /// Returns `false` if the entity is not an agent.
    pub fn command(&mut self, agent: Entity, command: MovementCommand) -> bool {
        let Some(position) = self.position(agent) else {
            return false;
        };
        let Ok(mut movement) = self.world.get_mut::<AgentMovement>(agent) else {
            return false;
        };

        if movement.apply(command, &self.navigation, position) {
            if let MovementCommand::Navigate(goal) = command {
                self.events.push(NavigationEvent::PathAssigned {
                    agent,
                    goal,
                    waypoints: movement.path().len(),
                });
            }
        }
        true
    }

    /// Advance one tick of `delta_time` seconds.
    pub fn step(&mut self, delta_time: f32) {
        self.events.swap();
        let snapshot = Arc::new(self.world.positions());

        let mut issued: Vec<(Entity, Vec<MovementCommand>)> = Vec::new();
        for (entity, (transform, brain)) in self.world.query_mut::<(&Transform, &mut Brain)>() {
            let events = self.events.for_agent(entity).cloned().collect();
            let mut ctx =
                BrainContext::new(entity, transform.position, delta_time, Arc::clone(&snapshot))
                    .with_events(events);
            brain.update(&mut ctx);
            if !ctx.commands.is_empty() {
                issued.push((entity, ctx.commands));
            }
        }
        for (entity, commands) in issued {
            for command in commands {
                self.command(entity, command);
            }
        }

        for (entity, (transform, velocity, movement)) in
            self.world
                .query_mut::<(&mut Transform, &mut Velocity, &mut AgentMovement)>()
        {
            let planar_velocity = movement.tick(
                entity,
                transform.position,
                snapshot.as_ref(),
                delta_time,
                &mut self.events,
            );
            velocity.linear = movement.world_velocity();
            transform.translate(velocity.linear * delta_time);

            if planar_velocity != Vec2::ZERO {
                transform.rotation = face(
                    transform.position,
                    transform.forward(),
                    transform.position + velocity.linear,
                    movement.face_degrees_per_second(),
                    delta_time,
                    transform.rotation,
                );
            }
        }

        self.ticks += 1;
        self.elapsed += delta_time;
    }

    /// Run `ticks` ticks of `delta_time` seconds.
    pub fn run(&mut self, delta_time: f32, ticks: usize) {
        for _ in 0..ticks {
            self.step(delta_time);
        }
    }
}
