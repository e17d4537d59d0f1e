// Host-authoritative tick processing.
//
// `HostSimulation::advance` is the only place the phases run, in a fixed order:
// input, integration, history barrier, existing transitions, new hits, timers.

use super::debug::TracingDebugSink;
use super::types::{TickReport, WorldUpdate};
use crate::domain::errors::LogicViolation;
use crate::domain::history::SnapshotHistory;
use crate::domain::ports::{DebugSink, PhysicsStep, TickClock, WorldHistory};
use crate::domain::scoreboard;
use crate::domain::spawner::{SpawnRegistry, Spawner};
use crate::domain::state::{AuthorityId, Buttons, EntityId, EntitySnapshot, PlayerInput};
use crate::domain::systems::authority::{self, HitContext};
use crate::domain::systems::fire::fire_control;
use crate::domain::systems::hazards::{self, HazardSpawner};
use crate::domain::systems::lag_compensation::{CompensationPolicy, LagCompensation};
use crate::domain::systems::movement::{self, KinematicStep, MovementConfig};
use crate::domain::systems::projectiles;
use crate::domain::timer::SimulationTick;
use crate::domain::tuning::ArenaTuning;
use crate::domain::world::World;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// One simulation, authoritative or mirrored, driven by the scheduler loop.
pub trait Simulation {
    fn is_authoritative(&self) -> bool;

    fn current_tick(&self) -> SimulationTick;

    /// Records a participant's intent for the next advance. Mirrors drop it.
    fn submit_input(&mut self, authority: AuthorityId, input: PlayerInput);

    fn advance(&mut self, clock: &dyn TickClock) -> TickReport;

    fn snapshots(&self) -> Vec<EntitySnapshot>;

    fn world_update(&self) -> WorldUpdate {
        let entities = self.snapshots();
        let scoreboard = scoreboard::rank(&entities);
        WorldUpdate {
            tick: self.current_tick().get(),
            entities,
            scoreboard,
        }
    }
}

/// Everything needed to build a host besides its injected ports.
#[derive(Debug, Clone)]
pub struct HostSettings {
    pub registry: SpawnRegistry,
    pub tuning: ArenaTuning,
    pub compensation: CompensationPolicy,
    pub history_ticks: usize,
    pub seed: u64,
}

pub struct HostSimulation<H = SnapshotHistory, P = KinematicStep, D = TracingDebugSink> {
    world: World,
    spawner: Spawner,
    hazards: HazardSpawner,
    history: H,
    physics: P,
    debug: D,
    lag: LagCompensation,
    tuning: ArenaTuning,
    tick: SimulationTick,
    // Input gathered per participant since the previous tick.
    inputs: BTreeMap<AuthorityId, PendingInput>,
    // Joins received before the match started.
    pending_joins: Vec<(AuthorityId, String)>,
    match_started: bool,
}

impl HostSimulation {
    pub fn new(settings: HostSettings) -> Self {
        let history = SnapshotHistory::new(settings.history_ticks);
        Self::with_ports(settings, history, KinematicStep, TracingDebugSink)
    }
}

impl<H, P, D> HostSimulation<H, P, D>
where
    H: WorldHistory,
    P: PhysicsStep,
    D: DebugSink,
{
    pub fn with_ports(settings: HostSettings, history: H, physics: P, debug: D) -> Self {
        // Separate streams so hazard timing never shifts spawn point choices.
        let spawner = Spawner::new(settings.registry, settings.tuning.player, settings.seed);
        let hazards = HazardSpawner::new(
            settings.tuning.hazard,
            settings.tuning.bounds,
            settings.seed.wrapping_add(1),
        );

        Self {
            world: World::new(),
            spawner,
            hazards,
            history,
            physics,
            debug,
            lag: LagCompensation::new(settings.compensation),
            tuning: settings.tuning,
            tick: SimulationTick::ZERO,
            inputs: BTreeMap::new(),
            pending_joins: Vec::new(),
            match_started: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entity_for(&self, authority: AuthorityId) -> Option<EntityId> {
        self.spawner.entity_for(authority)
    }

    pub fn match_started(&self) -> bool {
        self.match_started
    }

    /// Places everyone who joined during the lobby and arms the hazard timer.
    pub fn start_match<C: TickClock + ?Sized>(&mut self, clock: &C) {
        if self.match_started {
            return;
        }
        self.match_started = true;
        self.hazards.start(clock);

        for (authority, display_name) in std::mem::take(&mut self.pending_joins) {
            self.spawner
                .place_new_entity(&mut self.world, authority, display_name);
        }
        info!(tick = %clock.current_tick(), players = self.world.len(), "match started");
    }

    /// Late joiners are placed immediately; lobby joins wait for `start_match`.
    pub fn join(&mut self, authority: AuthorityId, display_name: String) -> Option<EntityId> {
        if !self.match_started {
            info!(%authority, "join queued until match start");
            self.pending_joins.retain(|(a, _)| *a != authority);
            self.pending_joins.push((authority, display_name));
            return None;
        }
        Some(
            self.spawner
                .place_new_entity(&mut self.world, authority, display_name),
        )
    }

    pub fn leave(&mut self, authority: AuthorityId) {
        self.pending_joins.retain(|(a, _)| *a != authority);
        self.inputs.remove(&authority);
        self.lag.latency_mut().remove(authority);

        self.spawner.despawn_on_leave(&mut self.world, authority);
        let retired = projectiles::retire_owned_by(&mut self.world, authority);
        info!(%authority, retired, "player left");
    }

    pub fn set_latency(&mut self, authority: AuthorityId, rtt: Duration) {
        self.lag.latency_mut().set(authority, rtt);
    }

    pub fn latency(&self, authority: AuthorityId) -> Option<Duration> {
        self.lag.latency().get(authority)
    }

    fn input_phase<C: TickClock + ?Sized>(
        &mut self,
        clock: &C,
        inputs: &BTreeMap<AuthorityId, PendingInput>,
        report: &mut TickReport,
    ) {
        let dt = clock.delta_time();
        let cfg = MovementConfig::new(&self.tuning.player, self.tuning.bounds);

        for (authority, pending) in inputs {
            // Stale authority: its ship is already gone.
            let Some(id) = self.spawner.entity_for(*authority) else {
                continue;
            };

            if let Some(shot) = fire_control(
                &mut self.world,
                id,
                &pending.for_fire_control(),
                clock,
                self.tuning.player.shot_delay,
                self.tuning.projectile,
            ) {
                report.fired.push(shot);
            }

            let Some(e) = self.world.get_mut(id) else {
                continue;
            };
            // Edges are detected against what the participant holds now.
            if let Some(player) = e.player_mut() {
                player.buttons_previous = pending.latest.buttons;
            }
            if e.alive {
                movement::steer(e, &pending.latest, dt, cfg);
            }
        }
    }

    fn integration_phase(&mut self, dt: f32) {
        let bounds = self.tuning.bounds;
        for e in self.world.iter_mut() {
            // Bullets follow their fixed heading below.
            if !e.alive || e.is_projectile() {
                continue;
            }
            self.physics.integrate(e, dt);
            if e.is_player() {
                movement::wrap_to_bounds(e, bounds);
            }
        }
        projectiles::advance_projectiles(&mut self.world, dt, self.tuning.projectile);
    }

    fn transition_phase<C: TickClock + ?Sized>(&mut self, clock: &C, report: &mut TickReport) {
        let waiting = self.world.ids_where(|e| e.is_player() && !e.alive);
        for id in waiting {
            match authority::try_respawn(&mut self.world, id, clock, &mut self.spawner) {
                Ok(Some(event)) => report.lifecycle.push(event),
                Ok(None) => {}
                Err(violation) => record_violation(&violation, report),
            }
        }

        report.expired = projectiles::retire_expired(&mut self.world, clock.current_tick());
        report.hazards_removed = self.hazards.despawn_out_of_bounds(&mut self.world);
        self.spawner.prune_stale(&self.world);
    }

    fn hit_phase<C: TickClock + ?Sized>(&mut self, clock: &C, report: &mut TickReport) {
        let ctx = HitContext {
            history: &self.history,
            clock,
            lag: &self.lag,
            tuning: &self.tuning.player,
            debug: &self.debug,
        };

        let players = self.world.ids_where(|e| e.is_player() && e.alive);
        for id in players {
            match authority::resolve_projectile_hit(&mut self.world, id, &ctx) {
                Ok(Some(event)) => report.lifecycle.push(event),
                Ok(None) => {}
                Err(violation) => {
                    record_violation(&violation, report);
                    continue;
                }
            }
            if let Some(event) = hazards::resolve_hazard_hit(&mut self.world, id, &ctx) {
                report.lifecycle.push(event);
            }
        }
    }
}

impl<H, P, D> Simulation for HostSimulation<H, P, D>
where
    H: WorldHistory,
    P: PhysicsStep,
    D: DebugSink,
{
    fn is_authoritative(&self) -> bool {
        true
    }

    fn current_tick(&self) -> SimulationTick {
        self.tick
    }

    fn submit_input(&mut self, authority: AuthorityId, input: PlayerInput) {
        match input.sanitized() {
            Some(input) => {
                self.inputs
                    .entry(authority)
                    .and_modify(|pending| pending.merge(input))
                    .or_insert_with(|| PendingInput::new(input));
            }
            None => debug!(%authority, "non-finite input dropped"),
        }
    }

    fn advance(&mut self, clock: &dyn TickClock) -> TickReport {
        let tick = clock.current_tick();
        let mut report = TickReport::new(tick);
        let inputs = std::mem::take(&mut self.inputs);

        self.input_phase(clock, &inputs, &mut report);
        self.integration_phase(clock.delta_time());

        // Barrier: every query this tick sees the post-integration world.
        self.history.record(tick, self.world.colliders());

        self.transition_phase(clock, &mut report);
        self.hit_phase(clock, &mut report);

        if self.match_started {
            if let Some(hazard) = self.hazards.tick(&mut self.world, clock) {
                report.hazards_spawned.push(hazard);
            }
        }

        self.tick = tick;
        report
    }

    fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.world.snapshots()
    }
}

/// Everything one participant sent since the previous tick.
///
/// Axes follow the newest message. Buttons seen at any point are kept, so a press and
/// release landing between two ticks still fires.
#[derive(Debug, Clone, Copy)]
struct PendingInput {
    latest: PlayerInput,
    seen: Buttons,
}

impl PendingInput {
    fn new(input: PlayerInput) -> Self {
        Self {
            latest: input,
            seen: input.buttons,
        }
    }

    fn merge(&mut self, input: PlayerInput) {
        self.latest = input;
        self.seen = self.seen | input.buttons;
    }

    fn for_fire_control(&self) -> PlayerInput {
        PlayerInput {
            buttons: self.seen,
            ..self.latest
        }
    }
}

// Logged and skipped; the rest of the tick carries on.
fn record_violation(violation: &LogicViolation, report: &mut TickReport) {
    error!(error = %violation, tick = %report.tick, "logic violation; entity skipped");
    report.violations += 1;
    debug_assert!(false, "{violation}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::Vec2;
    use crate::domain::state::{EntityKind, HazardState};
    use crate::domain::systems::authority::LifecycleEvent;
    use crate::domain::test_support::RecordingSink;
    use crate::domain::tuning::HazardTuning;
    use crate::use_cases::clock::FixedStepClock;
    use crate::domain::timer::TickRate;

    fn settings() -> HostSettings {
        let tuning = ArenaTuning {
            hazard: HazardTuning {
                enabled: false,
                ..HazardTuning::default()
            },
            ..ArenaTuning::default()
        };
        HostSettings {
            registry: SpawnRegistry::new(vec![Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0)])
                .expect("registry"),
            tuning,
            compensation: CompensationPolicy::None,
            history_ticks: 64,
            seed: 9,
        }
    }

    fn host() -> (HostSimulation<SnapshotHistory, KinematicStep, RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        let host = HostSimulation::with_ports(
            settings(),
            SnapshotHistory::new(64),
            KinematicStep,
            sink.clone(),
        );
        (host, sink)
    }

    fn fire_at(host: &mut HostSimulation<SnapshotHistory, KinematicStep, RecordingSink>, who: u64, horizontal: f32) {
        host.submit_input(
            AuthorityId(who),
            PlayerInput {
                horizontal,
                vertical: 0.0,
                buttons: Buttons::FIRE,
            },
        );
    }

    #[test]
    fn when_joining_before_the_match_then_placement_waits_for_start() {
        let (mut host, _) = host();
        let clock = FixedStepClock::new(TickRate::DEFAULT);

        assert_eq!(host.join(AuthorityId(1), "A".into()), None);
        assert!(host.world().is_empty());

        host.start_match(&clock);
        assert!(host.entity_for(AuthorityId(1)).is_some());

        // Late joiner goes straight in.
        assert!(host.join(AuthorityId(2), "B".into()).is_some());
        assert_eq!(host.world().len(), 2);
    }

    #[test]
    fn when_an_enemy_bullet_reaches_a_ship_then_it_dies_once_and_the_bullet_retires() {
        let (mut host, sink) = host();
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        let a = host.join(AuthorityId(1), "A".into()).expect("placed");
        let b = host.join(AuthorityId(2), "B".into()).expect("placed");

        // Line them up 10 units apart on the x axis.
        let (pa, pb) = (Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        host.world.get_mut(a).expect("a").position = pa;
        host.world.get_mut(b).expect("b").position = pb;

        clock.advance();
        fire_at(&mut host, 1, 1.0);
        let report = host.advance(&clock);
        assert_eq!(report.fired.len(), 1);

        let mut deaths = 0;
        for _ in 0..30 {
            clock.advance();
            // Keep both ships parked.
            host.world.get_mut(a).expect("a").velocity = Vec2::ZERO;
            if let Some(ship) = host.world.get_mut(b) {
                ship.velocity = Vec2::ZERO;
            }
            let report = host.advance(&clock);
            deaths += report
                .lifecycle
                .iter()
                .filter(|e| matches!(e, LifecycleEvent::Died { entity, .. } if *entity == b))
                .count();
        }

        assert_eq!(deaths, 1);
        assert!(!host.world().get(b).expect("b").alive);
        assert!(host.world().get(a).expect("a").alive);
        assert!(host.world().iter().all(|e| !e.is_projectile()));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn when_a_participant_leaves_then_their_ship_and_bullets_are_gone() {
        let (mut host, _) = host();
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        host.join(AuthorityId(1), "A".into());

        clock.advance();
        fire_at(&mut host, 1, 0.0);
        host.advance(&clock);
        assert_eq!(host.world().len(), 2);

        host.leave(AuthorityId(1));
        assert!(host.world().is_empty());
        assert_eq!(host.entity_for(AuthorityId(1)), None);

        // Input from the departed participant is a silent no-op.
        clock.advance();
        fire_at(&mut host, 1, 0.0);
        assert!(host.advance(&clock).is_quiet());
    }

    #[test]
    fn when_no_input_arrives_then_the_ship_keeps_its_velocity() {
        let (mut host, _) = host();
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        let a = host.join(AuthorityId(1), "A".into()).expect("placed");
        host.world.get_mut(a).expect("a").velocity = Vec2::new(6.0, 0.0);

        let start = host.world().get(a).expect("a").position;
        clock.advance();
        host.advance(&clock);

        let ship = host.world().get(a).expect("a");
        assert_eq!(ship.velocity, Vec2::new(6.0, 0.0));
        assert!((ship.position.x - (start.x + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn when_a_ship_sits_on_a_hazard_then_it_scores_and_the_hazard_is_consumed() {
        let (mut host, _) = host();
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        let a = host.join(AuthorityId(1), "A".into()).expect("placed");
        let at = host.world().get(a).expect("a").position;
        let hazard = host.world.spawn(
            at,
            Vec2::ZERO,
            None,
            EntityKind::Hazard(HazardState { radius: 1.5 }),
        );

        clock.advance();
        let report = host.advance(&clock);

        assert!(report.lifecycle.contains(&LifecycleEvent::HazardConsumed {
            entity: a,
            hazard,
            score: 1
        }));
        assert_eq!(host.world_update().scoreboard[0].score, 1);
    }

    #[test]
    fn when_fire_is_pressed_and_released_between_ticks_then_the_shot_still_fires() {
        let (mut host, _) = host();
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        let a = host.join(AuthorityId(1), "A".into()).expect("placed");

        clock.advance();
        fire_at(&mut host, 1, 0.0);
        host.submit_input(AuthorityId(1), PlayerInput::default());
        assert_eq!(host.advance(&clock).fired.len(), 1);

        // The release was seen, so the next press after the cooldown is a fresh edge.
        let previous = host.world().get(a).and_then(|e| e.player()).map(|p| p.buttons_previous);
        assert_eq!(previous, Some(Buttons::NONE));
        for _ in 0..20 {
            clock.advance();
            host.advance(&clock);
        }
        clock.advance();
        fire_at(&mut host, 1, 0.0);
        assert_eq!(host.advance(&clock).fired.len(), 1);
    }

    #[test]
    fn when_the_defender_has_latency_then_the_hit_lands_against_the_rewound_world() {
        let mut host = HostSimulation::new(HostSettings {
            compensation: CompensationPolicy::RoundTrip {
                interpolation_ticks: 0,
                max_rewind_ticks: 30,
            },
            ..settings()
        });
        let mut clock = FixedStepClock::new(TickRate::DEFAULT);
        host.start_match(&clock);
        host.join(AuthorityId(1), "A".into()).expect("placed");
        let b = host.join(AuthorityId(2), "B".into()).expect("placed");
        for (who, x) in [(AuthorityId(1), -5.0), (AuthorityId(2), 5.0)] {
            let id = host.entity_for(who).expect("ship");
            host.world.get_mut(id).expect("ship").position = Vec2::new(x, 0.0);
        }

        // 100ms at 60Hz rewinds the defender's queries by 6 ticks.
        host.set_latency(AuthorityId(2), Duration::from_millis(100));

        // The bullet covers 10/3 units a tick and sits on B after tick 3.
        let mut died_at = None;
        for _ in 0..12 {
            clock.advance();
            if clock.current_tick() == SimulationTick(1) {
                host.submit_input(
                    AuthorityId(1),
                    PlayerInput {
                        horizontal: 1.0,
                        vertical: 0.0,
                        buttons: Buttons::FIRE,
                    },
                );
            }
            let report = host.advance(&clock);
            if report
                .lifecycle
                .iter()
                .any(|e| matches!(e, LifecycleEvent::Died { entity, .. } if *entity == b))
            {
                died_at.get_or_insert(report.tick);
            }
        }
        assert_eq!(died_at, Some(SimulationTick(9)));

        host.leave(AuthorityId(2));
        assert_eq!(host.latency(AuthorityId(2)), None);
    }

    #[test]
    fn when_two_hosts_get_the_same_inputs_then_their_worlds_match() {
        let run = || {
            let mut host = HostSimulation::new(HostSettings {
                tuning: ArenaTuning::default(),
                ..settings()
            });
            let mut clock = FixedStepClock::new(TickRate::DEFAULT);
            host.join(AuthorityId(1), "A".into());
            host.join(AuthorityId(2), "B".into());
            host.start_match(&clock);
            for t in 0..300u32 {
                clock.advance();
                let buttons = if t % 7 == 0 { Buttons::FIRE } else { Buttons::NONE };
                host.submit_input(
                    AuthorityId(1),
                    PlayerInput {
                        horizontal: 1.0,
                        vertical: 0.0,
                        buttons,
                    },
                );
                host.advance(&clock);
            }
            host.snapshots()
        };

        assert_eq!(run(), run());
    }
}
