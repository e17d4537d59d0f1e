// Live entity store. Only the host mutates it.

use crate::domain::collision::ColliderRecord;
use crate::domain::math::Vec2;
use crate::domain::state::{AuthorityId, Entity, EntityId, EntityKind, EntitySnapshot};
use crate::domain::timer::Deadline;
use std::collections::BTreeMap;

/// Entities keyed by id. `BTreeMap` keeps iteration order stable across runs.
#[derive(Debug, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Instantiates an alive entity governed by the simulation rules.
    pub fn spawn(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        authority: Option<AuthorityId>,
        kind: EntityKind,
    ) -> EntityId {
        // `Default` leaves next_id at 0; ids start at 1 either way.
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;

        self.entities.insert(
            id,
            Entity {
                id,
                position,
                velocity,
                authority,
                alive: true,
                respawn: Deadline::NotRunning,
                kind,
            },
        );
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Ids matching `filter`, in ascending order.
    pub fn ids_where(&self, filter: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| filter(e))
            .map(|e| e.id)
            .collect()
    }

    /// Colliders for every alive entity; the input to the world history.
    pub fn colliders(&self) -> Vec<ColliderRecord> {
        self.entities
            .values()
            .filter(|e| e.alive)
            .map(Entity::collider)
            .collect()
    }

    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.entities.values().map(EntitySnapshot::from).collect()
    }
}
