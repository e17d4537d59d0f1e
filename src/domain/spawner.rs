// Host-only placement of participant ships over a fixed set of spawn points.

use crate::domain::errors::ConfigError;
use crate::domain::math::Vec2;
use crate::domain::state::{AuthorityId, Buttons, EntityId, EntityKind, PlayerState};
use crate::domain::timer::Deadline;
use crate::domain::tuning::PlayerTuning;
use crate::domain::world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Scene-provided spawn positions. Never empty once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRegistry {
    points: Vec<Vec2>,
}

impl SpawnRegistry {
    pub fn new(points: Vec<Vec2>) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::EmptySpawnRegistry);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.points.contains(&p)
    }
}

pub struct Spawner {
    registry: SpawnRegistry,
    rng: ChaCha8Rng,
    tuning: PlayerTuning,
    // Host-side back-reference from participant to its ship.
    player_objects: BTreeMap<AuthorityId, EntityId>,
}

impl Spawner {
    pub fn new(registry: SpawnRegistry, tuning: PlayerTuning, seed: u64) -> Self {
        Self {
            registry,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tuning,
            player_objects: BTreeMap::new(),
        }
    }

    /// Uniformly random spawn point.
    pub fn choose(&mut self) -> Vec2 {
        let index = self.rng.random_range(0..self.registry.points.len());
        self.registry.points[index]
    }

    pub fn entity_for(&self, authority: AuthorityId) -> Option<EntityId> {
        self.player_objects.get(&authority).copied()
    }

    pub fn tracked(&self) -> impl Iterator<Item = (AuthorityId, EntityId)> + '_ {
        self.player_objects.iter().map(|(a, e)| (*a, *e))
    }

    /// Spawns a ship for `authority` at a random point and tracks it.
    pub fn place_new_entity(
        &mut self,
        world: &mut World,
        authority: AuthorityId,
        display_name: String,
    ) -> EntityId {
        // A participant owns at most one ship.
        if let Some(existing) = self.entity_for(authority) {
            if world.contains(existing) {
                return existing;
            }
        }

        let position = self.choose();
        let kind = EntityKind::Player(PlayerState {
            display_name,
            score: 0,
            damage_radius: self.tuning.damage_radius,
            scale: self.tuning.min_scale,
            facing: Vec2::UP,
            buttons_previous: Buttons::NONE,
            shoot_cooldown: Deadline::NotRunning,
        });
        let id = world.spawn(position, Vec2::ZERO, Some(authority), kind);
        self.player_objects.insert(authority, id);

        info!(%authority, entity = %id, x = position.x, y = position.y, "player spawned");
        id
    }

    /// Moves an existing ship to a fresh random point. Returns the new position.
    pub fn relocate(&mut self, world: &mut World, entity: EntityId) -> Option<Vec2> {
        let position = self.choose();
        let e = world.get_mut(entity)?;
        e.position = position;
        Some(position)
    }

    /// Destroys the leaver's ship and clears the back-reference.
    pub fn despawn_on_leave(&mut self, world: &mut World, authority: AuthorityId) -> bool {
        let Some(entity) = self.player_objects.remove(&authority) else {
            debug!(%authority, "leave without a tracked ship");
            return false;
        };

        let removed = world.despawn(entity).is_some();
        info!(%authority, entity = %entity, removed, "player despawned");
        removed
    }

    /// Drops back-references whose ship no longer resolves.
    pub fn prune_stale(&mut self, world: &World) {
        self.player_objects.retain(|_, entity| world.contains(*entity));
    }
}
