//! Movement Event Queue
//!
//! A double-buffered queue of movement events. Agents report what happened
//! to their movement requests during a tick; brains and game code read those
//! reports on the next tick without the movement code knowing about them.
//!
//! # Example
//!
//! ```ignore
//! // During tick N the simulation pushes events
//! events.push(NavigationEvent::PathCompleted { agent, goal });
//!
//! // Tick N+1, after swap
//! events.swap();
//! for event in events.iter() {
//!     if let NavigationEvent::PathCompleted { agent, .. } = event {
//!         arrived.insert(*agent);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::ai::Behaviour;

// ============================================================================
// Event Types
// ============================================================================

/// Things that happen to an agent's movement.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NavigationEvent {
    /// A path was assigned by a navigate request.
    PathAssigned {
        /// The agent that will follow the path
        agent: Entity,
        /// Final destination
        goal: Vec3,
        /// Number of waypoints in the path
        waypoints: usize,
    },

    /// The agent consumed the last waypoint of its path.
    PathCompleted {
        /// The agent that arrived
        agent: Entity,
        /// Where it arrived
        goal: Vec3,
    },

    /// A movement request met its completion condition and was dropped.
    RequestCompleted {
        /// The agent whose request completed
        agent: Entity,
        /// Behaviour of the completed request
        behaviour: Behaviour,
    },

    /// A live target disappeared and the request following it was dropped.
    TargetLost {
        /// The agent whose request was dropped
        agent: Entity,
        /// The target that no longer exists
        target: Entity,
    },
}

impl NavigationEvent {
    /// The agent the event is about
    #[must_use]
    pub fn agent(&self) -> Entity {
        match self {
            Self::PathAssigned { agent, .. }
            | Self::PathCompleted { agent, .. }
            | Self::RequestCompleted { agent, .. }
            | Self::TargetLost { agent, .. } => *agent,
        }
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for tick-consistent event processing.
///
/// Events pushed during tick N are available for reading during tick N+1.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<NavigationEvent>,
    /// Events from previous tick, ready for processing
    processing: VecDeque<NavigationEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next tick.
    #[inline]
    pub fn push(&mut self, event: NavigationEvent) {
        self.pending.push_back(event);
    }

    /// Append several events to be processed next tick.
    pub fn extend(&mut self, events: impl IntoIterator<Item = NavigationEvent>) {
        self.pending.extend(events);
    }

    /// Swap the pending and processing queues.
    ///
    /// Call this once per tick, at the start of the update.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &NavigationEvent> {
        self.processing.iter()
    }

    /// Events from the previous tick concerning `agent`.
    pub fn for_agent(&self, agent: Entity) -> impl Iterator<Item = &NavigationEvent> {
        self.processing.iter().filter(move |e| e.agent() == agent)
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = NavigationEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next tick.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a test entity
    fn test_entity(world: &mut hecs::World) -> Entity {
        world.spawn(())
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut world = hecs::World::new();
        let agent = test_entity(&mut world);
        let mut queue = EventQueue::new();

        // Push event - should not be visible yet
        queue.push(NavigationEvent::PathCompleted {
            agent,
            goal: Vec3::X,
        });
        assert!(queue.is_empty(), "Events should not be visible before swap");

        // Swap - now event should be visible
        queue.swap();
        assert_eq!(queue.len(), 1);

        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(events[0], NavigationEvent::PathCompleted { .. }));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut world = hecs::World::new();
        let agent = test_entity(&mut world);
        let mut queue = EventQueue::new();

        queue.push(NavigationEvent::RequestCompleted {
            agent,
            behaviour: Behaviour::Seek,
        });
        queue.swap();

        queue.push(NavigationEvent::RequestCompleted {
            agent,
            behaviour: Behaviour::Flee,
        });

        // Should only see the first event
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            NavigationEvent::RequestCompleted {
                behaviour: Behaviour::Seek,
                ..
            }
        ));

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            NavigationEvent::RequestCompleted {
                behaviour: Behaviour::Flee,
                ..
            }
        ));
    }

    #[test]
    fn test_event_queue_for_agent() {
        let mut world = hecs::World::new();
        let a = test_entity(&mut world);
        let b = test_entity(&mut world);
        let mut queue = EventQueue::new();

        queue.extend([
            NavigationEvent::TargetLost { agent: a, target: b },
            NavigationEvent::PathCompleted {
                agent: b,
                goal: Vec3::ZERO,
            },
        ]);
        queue.swap();

        assert_eq!(queue.for_agent(a).count(), 1);
        assert_eq!(queue.for_agent(b).count(), 1);
    }

    #[test]
    fn test_event_queue_drain_and_clear() {
        let mut world = hecs::World::new();
        let agent = test_entity(&mut world);
        let mut queue = EventQueue::new();

        queue.push(NavigationEvent::PathAssigned {
            agent,
            goal: Vec3::ONE,
            waypoints: 3,
        });
        queue.swap();
        assert_eq!(queue.drain().count(), 1);
        assert!(queue.is_empty());

        queue.push(NavigationEvent::PathCompleted {
            agent,
            goal: Vec3::ONE,
        });
        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
