use crate::domain::math::Vec2;
use crate::domain::ports::TickClock;
use crate::domain::state::{AuthorityId, EntityId, EntityKind, ProjectileState};
use crate::domain::timer::{self, SimulationTick};
use crate::domain::tuning::ProjectileTuning;
use crate::domain::world::World;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    Expired,
    Hit,
    OwnerLeft,
}

/// Spawns a bullet with a fixed heading and schedules its lifetime.
pub fn spawn_projectile<C: TickClock + ?Sized>(
    world: &mut World,
    owner: AuthorityId,
    origin: Vec2,
    heading: Vec2,
    clock: &C,
    tuning: ProjectileTuning,
) -> EntityId {
    let heading = heading.normalized();
    let lifetime = timer::start(tuning.life_time, clock.current_tick(), clock.tick_rate());

    let id = world.spawn(
        origin,
        heading * tuning.speed,
        Some(owner),
        EntityKind::Projectile(ProjectileState {
            owner,
            lifetime,
            heading,
            radius: tuning.radius,
        }),
    );

    debug!(projectile = %id, %owner, tick = %clock.current_tick(), "projectile spawned");
    id
}

/// position += heading * speed * dt for every bullet in flight.
pub fn advance_projectiles(world: &mut World, dt: f32, tuning: ProjectileTuning) {
    for e in world.iter_mut() {
        let EntityKind::Projectile(p) = &e.kind else {
            continue;
        };
        if !e.alive {
            continue;
        }
        e.position += p.heading * (tuning.speed * dt);
    }
}

/// Retires every bullet whose lifetime deadline has been reached.
pub fn retire_expired(world: &mut World, tick: SimulationTick) -> Vec<EntityId> {
    let expired = world.ids_where(|e| {
        e.projectile()
            .is_some_and(|p| timer::is_expired(p.lifetime, tick))
    });

    for id in &expired {
        retire(world, *id, RetireReason::Expired);
    }
    expired
}

pub fn retire(world: &mut World, id: EntityId, reason: RetireReason) -> bool {
    let removed = world.despawn(id).is_some();
    if removed {
        debug!(projectile = %id, ?reason, "projectile retired");
    }
    removed
}

/// Retires bullets fired by a participant who left.
pub fn retire_owned_by(world: &mut World, owner: AuthorityId) -> usize {
    let owned = world.ids_where(|e| e.projectile().is_some_and(|p| p.owner == owner));
    for id in &owned {
        retire(world, *id, RetireReason::OwnerLeft);
    }
    owned.len()
}
