// Participant lifecycle: Alive -> Respawning -> Alive.
//
// Only the host calls the functions that write `alive` or schedule the respawn deadline.
// `apply_death_reset` is the one piece mirrors also run when they observe a death.

use crate::domain::collision::CollisionMask;
use crate::domain::errors::LogicViolation;
use crate::domain::math::Vec2;
use crate::domain::ports::{DebugSink, TickClock, WorldHistory};
use crate::domain::spawner::Spawner;
use crate::domain::state::{AuthorityId, Buttons, Entity, EntityId};
use crate::domain::systems::lag_compensation::LagCompensation;
use crate::domain::systems::projectiles::{self, RetireReason};
use crate::domain::timer::{self, Deadline, SimulationTick};
use crate::domain::tuning::PlayerTuning;
use crate::domain::world::World;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Died {
        entity: EntityId,
        projectile: EntityId,
        shooter: AuthorityId,
        respawn_at: SimulationTick,
    },
    Respawned {
        entity: EntityId,
        position: Vec2,
    },
    HazardConsumed {
        entity: EntityId,
        hazard: EntityId,
        score: u32,
    },
}

/// Local side effects of dying: stop moving, lose score, shrink back.
pub fn apply_death_reset(entity: &mut Entity, tuning: &PlayerTuning) {
    entity.velocity = Vec2::ZERO;
    if let Some(player) = entity.player_mut() {
        player.score = 0;
        player.scale = tuning.scale_for(0);
    }
}

/// Host-only Alive -> Respawning. Refuses a second death.
pub fn mark_hit<C: TickClock + ?Sized>(
    entity: &mut Entity,
    clock: &C,
    tuning: &PlayerTuning,
) -> Result<SimulationTick, LogicViolation> {
    let tick = clock.current_tick();
    if !entity.alive {
        return Err(LogicViolation::AlreadyDead {
            entity: entity.id,
            tick,
        });
    }

    entity.alive = false;
    apply_death_reset(entity, tuning);
    // Respawn checks run before hits within a tick, so the earliest return is next tick.
    let respawn_at = match timer::start(tuning.respawn_seconds, tick, clock.tick_rate()) {
        Deadline::At(at) if at > tick => at,
        _ => tick.next(),
    };
    entity.respawn = Deadline::At(respawn_at);

    Ok(respawn_at)
}

/// Host-only Respawning -> Alive; the caller has already relocated the entity.
pub fn complete_respawn(entity: &mut Entity, tick: SimulationTick) -> Result<(), LogicViolation> {
    if !entity.respawn.is_running() {
        return Err(LogicViolation::RespawnWithoutDeadline {
            entity: entity.id,
            tick,
        });
    }

    entity.respawn = Deadline::NotRunning;
    entity.alive = true;
    entity.velocity = Vec2::ZERO;
    if let Some(player) = entity.player_mut() {
        player.buttons_previous = Buttons::NONE;
        player.shoot_cooldown = Deadline::NotRunning;
    }
    Ok(())
}

/// Brings a ship back once its respawn deadline has expired.
pub fn try_respawn<C: TickClock + ?Sized>(
    world: &mut World,
    id: EntityId,
    clock: &C,
    spawner: &mut Spawner,
) -> Result<Option<LifecycleEvent>, LogicViolation> {
    let tick = clock.current_tick();
    // Stale reference: already removed, nothing to do.
    let Some(e) = world.get(id) else {
        return Ok(None);
    };
    if e.alive || !timer::is_expired(e.respawn, tick) {
        return Ok(None);
    }

    let Some(position) = spawner.relocate(world, id) else {
        return Ok(None);
    };
    let Some(e) = world.get_mut(id) else {
        return Ok(None);
    };
    complete_respawn(e, tick)?;

    info!(entity = %id, %tick, x = position.x, y = position.y, "player respawned");
    Ok(Some(LifecycleEvent::Respawned {
        entity: id,
        position,
    }))
}

/// Everything the hit check reads besides the world itself.
pub struct HitContext<'a, H: ?Sized, C: ?Sized, D: ?Sized> {
    pub history: &'a H,
    pub clock: &'a C,
    pub lag: &'a LagCompensation,
    pub tuning: &'a PlayerTuning,
    pub debug: &'a D,
}

/// Defender-side check for incoming projectiles.
///
/// The nearest live bullet not fired by the defender kills it and is retired.
pub fn resolve_projectile_hit<H, C, D>(
    world: &mut World,
    id: EntityId,
    ctx: &HitContext<'_, H, C, D>,
) -> Result<Option<LifecycleEvent>, LogicViolation>
where
    H: WorldHistory + ?Sized,
    C: TickClock + ?Sized,
    D: DebugSink + ?Sized,
{
    let Some(defender) = world.get(id) else {
        return Ok(None);
    };
    let Some(player) = defender.player() else {
        return Ok(None);
    };
    if !defender.alive {
        return Ok(None);
    }

    let hits = ctx.lag.query(
        ctx.history,
        ctx.clock,
        defender.position,
        player.damage_radius,
        defender.authority,
        CollisionMask::PROJECTILE,
    );

    let incoming = hits.iter().find_map(|hit| {
        // Hits on bullets that already retired resolve to nothing.
        let bullet = world.get(hit.target)?;
        let p = bullet.projectile()?;
        if !bullet.alive || defender.authority == Some(p.owner) {
            return None;
        }
        Some((hit.target, p.owner))
    });
    let Some((projectile, shooter)) = incoming else {
        return Ok(None);
    };

    let Some(defender) = world.get_mut(id) else {
        return Ok(None);
    };
    let respawn_at = mark_hit(defender, ctx.clock, ctx.tuning)?;
    projectiles::retire(world, projectile, RetireReason::Hit);

    ctx.debug.push(&format!("Collide {id} with {projectile}"));
    info!(
        victim = %id,
        %shooter,
        %projectile,
        respawn_at = %respawn_at,
        "player hit"
    );

    Ok(Some(LifecycleEvent::Died {
        entity: id,
        projectile,
        shooter,
        respawn_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::SnapshotHistory;
    use crate::domain::spawner::SpawnRegistry;
    use crate::domain::systems::lag_compensation::CompensationPolicy;
    use crate::domain::systems::projectiles::spawn_projectile;
    use crate::domain::test_support::{FixedClock, RecordingSink};
    use crate::domain::tuning::ProjectileTuning;

    struct Fixture {
        world: World,
        spawner: Spawner,
        history: SnapshotHistory,
        lag: LagCompensation,
        tuning: PlayerTuning,
        sink: RecordingSink,
    }

    impl Fixture {
        fn new() -> Self {
            let registry =
                SpawnRegistry::new(vec![Vec2::new(20.0, 20.0)]).expect("registry");
            Self {
                world: World::new(),
                spawner: Spawner::new(registry, PlayerTuning::default(), 5),
                history: SnapshotHistory::new(64),
                lag: LagCompensation::new(CompensationPolicy::None),
                tuning: PlayerTuning::default(),
                sink: RecordingSink::default(),
            }
        }

        fn player(&mut self, authority: u64, at: Vec2) -> EntityId {
            let id = self
                .spawner
                .place_new_entity(&mut self.world, AuthorityId(authority), "P".into());
            self.world.get_mut(id).expect("spawned").position = at;
            id
        }

        fn bullet(&mut self, owner: u64, at: Vec2, tick: u64) -> EntityId {
            spawn_projectile(
                &mut self.world,
                AuthorityId(owner),
                at,
                Vec2::UP,
                &FixedClock::at(tick),
                ProjectileTuning::default(),
            )
        }

        fn record(&mut self, tick: u64) {
            self.history.record(SimulationTick(tick), self.world.colliders());
        }

        fn resolve(&mut self, id: EntityId, tick: u64) -> Result<Option<LifecycleEvent>, LogicViolation> {
            let clock = FixedClock::at(tick);
            let ctx = HitContext {
                history: &self.history,
                clock: &clock,
                lag: &self.lag,
                tuning: &self.tuning,
                debug: &self.sink,
            };
            resolve_projectile_hit(&mut self.world, id, &ctx)
        }
    }

    #[test]
    fn when_own_bullet_overlaps_then_no_hit_is_reported() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        let mine = f.bullet(1, Vec2::ZERO, 1);
        f.record(1);

        assert_eq!(f.resolve(me, 1), Ok(None));
        assert!(f.world.get(me).expect("ship").alive);
        assert!(f.world.contains(mine));
    }

    #[test]
    fn when_enemy_bullet_overlaps_then_defender_dies_and_bullet_retires() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        let theirs = f.bullet(2, Vec2::new(1.0, 0.0), 100);
        f.world.get_mut(me).expect("ship").player_mut().expect("player").score = 4;
        f.record(100);

        let event = f.resolve(me, 100).expect("no violation");
        assert_eq!(
            event,
            Some(LifecycleEvent::Died {
                entity: me,
                projectile: theirs,
                shooter: AuthorityId(2),
                respawn_at: SimulationTick(340),
            })
        );

        let ship = f.world.get(me).expect("ship");
        assert!(!ship.alive);
        assert_eq!(ship.velocity, Vec2::ZERO);
        assert_eq!(ship.player().map(|p| p.score), Some(0));
        assert!(!f.world.contains(theirs));
        assert_eq!(f.sink.lines().len(), 1);
    }

    #[test]
    fn when_own_bullet_is_nearer_than_an_enemy_one_then_the_enemy_bullet_still_counts() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        f.bullet(1, Vec2::ZERO, 1);
        let theirs = f.bullet(2, Vec2::new(2.0, 0.0), 1);
        f.record(1);

        let event = f.resolve(me, 1).expect("no violation");
        assert!(matches!(event, Some(LifecycleEvent::Died { projectile, .. }) if projectile == theirs));
    }

    #[test]
    fn when_already_dead_then_a_second_overlap_is_ignored() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        f.bullet(2, Vec2::ZERO, 1);
        f.bullet(3, Vec2::ZERO, 1);
        f.record(1);

        assert!(f.resolve(me, 1).expect("no violation").is_some());
        assert_eq!(f.resolve(me, 1), Ok(None));
        assert_eq!(f.resolve(me, 2), Ok(None));
    }

    #[test]
    fn when_marking_a_dead_entity_then_a_logic_violation_is_returned() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        let clock = FixedClock::at(3);
        let ship = f.world.get_mut(me).expect("ship");

        assert!(mark_hit(ship, &clock, &f.tuning).is_ok());
        assert_eq!(
            mark_hit(ship, &clock, &f.tuning),
            Err(LogicViolation::AlreadyDead {
                entity: me,
                tick: SimulationTick(3)
            })
        );
    }

    #[test]
    fn when_respawn_delay_is_zero_then_the_ship_stays_down_until_the_next_tick() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        f.tuning.respawn_seconds = 0.0;
        f.bullet(2, Vec2::ZERO, 5);
        f.record(5);

        let event = f.resolve(me, 5).expect("no violation");
        assert!(matches!(
            event,
            Some(LifecycleEvent::Died { respawn_at, .. }) if respawn_at == SimulationTick(6)
        ));
        let ship = f.world.get(me).expect("ship");
        assert!(!ship.alive);
        assert!(!timer::is_expired(ship.respawn, SimulationTick(5)));

        let event = try_respawn(&mut f.world, me, &FixedClock::at(6), &mut f.spawner);
        assert!(matches!(event, Ok(Some(LifecycleEvent::Respawned { .. }))));
    }

    #[test]
    fn when_respawn_deadline_expires_then_ship_returns_at_a_spawn_point() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        mark_hit(f.world.get_mut(me).expect("ship"), &FixedClock::at(100), &f.tuning)
            .expect("first death");

        let early = try_respawn(&mut f.world, me, &FixedClock::at(339), &mut f.spawner);
        assert_eq!(early, Ok(None));
        assert!(!f.world.get(me).expect("ship").alive);

        let event = try_respawn(&mut f.world, me, &FixedClock::at(340), &mut f.spawner)
            .expect("no violation");
        assert_eq!(
            event,
            Some(LifecycleEvent::Respawned {
                entity: me,
                position: Vec2::new(20.0, 20.0)
            })
        );
        let ship = f.world.get(me).expect("ship");
        assert!(ship.alive);
        assert_eq!(ship.respawn, Deadline::NotRunning);
    }

    #[test]
    fn when_completing_a_respawn_without_a_deadline_then_a_logic_violation_is_returned() {
        let mut f = Fixture::new();
        let me = f.player(1, Vec2::ZERO);
        let ship = f.world.get_mut(me).expect("ship");
        ship.alive = false;

        assert!(matches!(
            complete_respawn(ship, SimulationTick(9)),
            Err(LogicViolation::RespawnWithoutDeadline { .. })
        ));
        assert!(!ship.alive);
    }

    #[test]
    fn when_entity_is_gone_then_respawn_and_hit_checks_are_no_ops() {
        let mut f = Fixture::new();
        assert_eq!(
            try_respawn(&mut f.world, EntityId(77), &FixedClock::at(1), &mut f.spawner),
            Ok(None)
        );
        assert_eq!(f.resolve(EntityId(77), 1), Ok(None));
    }
}
