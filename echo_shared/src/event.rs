//! Event and messaging system.
//!
//! A small typed event bus. The game loop pushes gameplay events during a
//! tick; the client drains the ones it cares about afterwards (echo saves,
//! HUD feedback).

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use serde::{Deserialize, Serialize};

use crate::{ecs::EntityId, math::Vec2};

/// Typed event bus.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    /// Pushes an event into the queue.
    pub fn push<E: 'static + Send + Sync>(&mut self, e: E) {
        let q = self
            .queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        let q = q.downcast_mut::<Vec<E>>().expect("queue type mismatch");
        q.push(e);
    }

    /// Drains all queued events of a type.
    pub fn drain<E: 'static + Send + Sync>(&mut self) -> Vec<E> {
        self.queues
            .remove(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast::<Vec<E>>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Number of queued events of a type.
    pub fn pending<E: 'static + Send + Sync>(&self) -> usize {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<E>>())
            .map_or(0, Vec::len)
    }

    /// Drops every queued event.
    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

/// An enemy was destroyed by an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyDefeated {
    pub enemy: EntityId,
    pub position: Vec2,
}

/// An echo was granted and should be saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoCollected {
    pub echo_type: String,
}

/// An enemy touched the player while the player was vulnerable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactHit {
    pub enemy: EntityId,
}

/// Dash state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashEvent {
    Started,
    Ended,
}

/// A new enemy entered the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawned {
    pub enemy: EntityId,
    pub position: Vec2,
}
