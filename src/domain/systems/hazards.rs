// Drifting hazards: spawned at the arena edge on a random timer, collected by ships.

use crate::domain::collision::CollisionMask;
use crate::domain::math::Vec2;
use crate::domain::ports::{DebugSink, TickClock, WorldHistory};
use crate::domain::state::{EntityId, EntityKind, HazardState};
use crate::domain::systems::authority::{HitContext, LifecycleEvent};
use crate::domain::timer::{self, Deadline};
use crate::domain::tuning::{ArenaBounds, HazardTuning};
use crate::domain::world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Host-only spawner; nothing here is replicated.
pub struct HazardSpawner {
    rng: ChaCha8Rng,
    tuning: HazardTuning,
    bounds: ArenaBounds,
    spawn_delay: Deadline,
    tracked: Vec<EntityId>,
}

impl HazardSpawner {
    pub fn new(tuning: HazardTuning, bounds: ArenaBounds, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tuning,
            bounds,
            spawn_delay: Deadline::NotRunning,
            tracked: Vec::new(),
        }
    }

    pub fn tracked(&self) -> &[EntityId] {
        &self.tracked
    }

    /// Arms the delay until the first spawn.
    pub fn start<C: TickClock + ?Sized>(&mut self, clock: &C) {
        if self.tuning.enabled {
            self.schedule_next(clock);
        }
    }

    /// Spawns a hazard when the delay has expired and re-arms it.
    pub fn tick<C: TickClock + ?Sized>(&mut self, world: &mut World, clock: &C) -> Option<EntityId> {
        if !timer::is_expired(self.spawn_delay, clock.current_tick()) {
            return None;
        }

        let angle = self.rng.random_range(0.0..TAU);
        let direction = Vec2::new(angle.cos(), angle.sin());
        let position = self.edge_position(direction);
        let speed = uniform(&mut self.rng, self.tuning.min_speed, self.tuning.max_speed);

        let id = world.spawn(
            position,
            direction * speed,
            None,
            EntityKind::Hazard(HazardState {
                radius: self.tuning.radius,
            }),
        );
        self.tracked.push(id);
        self.schedule_next(clock);

        debug!(hazard = %id, x = position.x, y = position.y, speed, "hazard spawned");
        Some(id)
    }

    /// Drops stale references and despawns hazards that drifted out of the arena.
    pub fn despawn_out_of_bounds(&mut self, world: &mut World) -> Vec<EntityId> {
        let bounds = self.bounds;
        let mut removed = Vec::new();

        self.tracked.retain(|id| match world.get(*id) {
            None => false,
            Some(e) if bounds.contains(e.position) => true,
            Some(_) => {
                world.despawn(*id);
                removed.push(*id);
                false
            }
        });
        removed
    }

    fn schedule_next<C: TickClock + ?Sized>(&mut self, clock: &C) {
        let delay = uniform(
            &mut self.rng,
            self.tuning.min_spawn_delay,
            self.tuning.max_spawn_delay,
        );
        self.spawn_delay = timer::start(delay, clock.current_tick(), clock.tick_rate());
    }

    // Entry point on the edge opposite the travel direction, nudged inside.
    fn edge_position(&self, direction: Vec2) -> Vec2 {
        let (bx, by) = (self.bounds.half_width, self.bounds.half_height);
        let p = if direction.x.abs() > direction.y.abs() {
            Vec2::new(-direction.x.signum() * bx, direction.y * by)
        } else {
            Vec2::new(direction.x * bx, -direction.y.signum() * by)
        };
        p - p.normalized() * ArenaBounds::EDGE_INSET
    }
}

fn uniform(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Ship-side check for hazards: the nearest live one is consumed for a point.
pub fn resolve_hazard_hit<H, C, D>(
    world: &mut World,
    id: EntityId,
    ctx: &HitContext<'_, H, C, D>,
) -> Option<LifecycleEvent>
where
    H: WorldHistory + ?Sized,
    C: TickClock + ?Sized,
    D: DebugSink + ?Sized,
{
    let ship = world.get(id)?;
    let radius = ship.player()?.damage_radius;
    if !ship.alive {
        return None;
    }

    let hits = ctx.lag.query(
        ctx.history,
        ctx.clock,
        ship.position,
        radius,
        ship.authority,
        CollisionMask::HAZARD,
    );
    let hazard = hits
        .iter()
        .find(|hit| world.get(hit.target).is_some_and(|h| h.is_hazard() && h.alive))?
        .target;

    world.despawn(hazard);
    let player = world.get_mut(id)?.player_mut()?;
    player.score += 1;
    player.scale = ctx.tuning.scale_for(player.score);
    let score = player.score;

    ctx.debug.push(&format!("Collide {id} with {hazard}"));
    info!(player = %id, %hazard, score, "hazard consumed");

    Some(LifecycleEvent::HazardConsumed {
        entity: id,
        hazard,
        score,
    })
}
