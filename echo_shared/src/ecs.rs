//! Entity/component system (minimal ECS).
//!
//! Typed component storages keyed by entity id. Small on purpose: the arena
//! holds one player and a handful of enemies.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
};

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Opaque entity id. Ids are never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Type-erased storage so `despawn` can reach every component type.
trait Storage: Send + Sync {
    fn remove(&mut self, entity: EntityId);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// BTreeMap keeps iteration in entity order so the simulation stays deterministic.
impl<T: 'static + Send + Sync> Storage for BTreeMap<EntityId, T> {
    fn remove(&mut self, entity: EntityId) {
        BTreeMap::remove(self, &entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Simple world that can store typed components.
#[derive(Default)]
pub struct World {
    next_id: u64,
    storages: HashMap<TypeId, Box<dyn Storage>>,
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Removes every component of an entity.
    pub fn despawn(&mut self, entity: EntityId) {
        for storage in self.storages.values_mut() {
            storage.remove(entity);
        }
    }

    /// Inserts/replaces a component for an entity.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: EntityId, component: T) {
        self.storage_mut::<T>().insert(entity, component);
    }

    /// Gets a component reference.
    pub fn get<T: 'static + Send + Sync>(&self, entity: EntityId) -> Option<&T> {
        self.storage::<T>().and_then(|storage| storage.get(&entity))
    }

    /// Gets a mutable component reference.
    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<BTreeMap<EntityId, T>>())
            .and_then(|storage| storage.get_mut(&entity))
    }

    /// Iterates entities with a given component, in id order.
    pub fn iter<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.iter().map(|(k, v)| (*k, v)))
    }

    /// Number of entities carrying component `T`.
    pub fn count<T: 'static + Send + Sync>(&self) -> usize {
        self.storage::<T>().map_or(0, BTreeMap::len)
    }

    fn storage<T: 'static + Send + Sync>(&self) -> Option<&BTreeMap<EntityId, T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<BTreeMap<EntityId, T>>())
    }

    fn storage_mut<T: 'static + Send + Sync>(&mut self) -> &mut BTreeMap<EntityId, T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(BTreeMap::<EntityId, T>::new()))
            .as_any_mut()
            .downcast_mut::<BTreeMap<EntityId, T>>()
            .expect("storage type mismatch")
    }
}

/// Common component: position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position(pub Vec2);

/// Common component: velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Velocity(pub Vec2);
