//! World wrapper around hecs

use glam::Vec3;
use hecs::Entity;

use super::components::Transform;
use crate::ai::{PositionSnapshot, TargetRegistry};

/// Registry of agents and the things they move relative to
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or lacks the component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or lacks the component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    #[must_use]
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities from the world
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    /// Position of every entity with a transform
    #[must_use]
    pub fn positions(&self) -> PositionSnapshot {
        self.inner
            .query::<&Transform>()
            .iter()
            .map(|(entity, transform)| (entity, transform.position))
            .collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetRegistry for World {
    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.inner
            .get::<&Transform>(entity)
            .ok()
            .map(|transform| transform.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_snapshot() {
        let mut world = World::new();
        let a = world.spawn((Transform::from_position(Vec3::X),));
        let b = world.spawn((Transform::from_position(Vec3::Z),));
        let bare = world.spawn(());

        let snapshot = world.positions();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.position_of(a), Some(Vec3::X));
        assert_eq!(snapshot.position_of(b), Some(Vec3::Z));
        assert_eq!(snapshot.position_of(bare), None);
    }

    #[test]
    fn test_despawned_target_does_not_resolve() {
        let mut world = World::new();
        let target = world.spawn((Transform::from_position(Vec3::ONE),));
        assert_eq!(world.position_of(target), Some(Vec3::ONE));

        world.despawn(target).unwrap();
        assert!(!world.contains(target));
        assert_eq!(world.position_of(target), None);
    }
}
