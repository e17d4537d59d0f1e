// Non-authoritative view of the arena built from replicated snapshots.
//
// Never schedules timers or writes the alive flag on its own; it adopts whatever the host
// published and only runs the local death reset when it sees a ship go down.

use super::simulation::Simulation;
use super::types::{TickReport, WorldUpdate};
use crate::domain::math::Vec2;
use crate::domain::ports::TickClock;
use crate::domain::state::{
    AuthorityId, Buttons, Entity, EntityId, EntityKind, EntitySnapshot, HazardState,
    PlayerInput, PlayerState, ProjectileState, SnapshotPayload,
};
use crate::domain::systems::authority::apply_death_reset;
use crate::domain::timer::{Deadline, SimulationTick};
use crate::domain::tuning::PlayerTuning;
use std::collections::BTreeMap;
use tracing::debug;

pub struct RemoteMirror {
    entities: BTreeMap<EntityId, Entity>,
    tuning: PlayerTuning,
    tick: SimulationTick,
    pending: Option<WorldUpdate>,
}

impl RemoteMirror {
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            entities: BTreeMap::new(),
            tuning,
            tick: SimulationTick::ZERO,
            pending: None,
        }
    }

    /// Queues an update for the next advance; only the newest one is kept.
    pub fn receive(&mut self, update: WorldUpdate) {
        if update.tick < self.tick.get() {
            return;
        }
        self.pending = Some(update);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn adopt(&mut self, update: WorldUpdate, clock: &dyn TickClock, report: &mut TickReport) {
        let elapsed_ticks = update.tick.saturating_sub(self.tick.get()).max(1);
        let dt = elapsed_ticks as f32 * clock.delta_time();

        let mut next = BTreeMap::new();
        for snapshot in &update.entities {
            let (mut entity, died) = match self.entities.remove(&snapshot.id) {
                Some(mut known) => {
                    let was_alive = known.alive;
                    known.velocity = (snapshot.position - known.position) * (1.0 / dt);
                    overwrite(&mut known, snapshot, &self.tuning);
                    let died = was_alive && !known.alive;
                    (known, died)
                }
                None => (mirror_entity(snapshot, &self.tuning), false),
            };
            if died {
                apply_death_reset(&mut entity, &self.tuning);
                report.deaths_observed.push(entity.id);
            }
            next.insert(snapshot.id, entity);
        }

        self.entities = next;
        self.tick = SimulationTick(update.tick);
    }
}

impl Simulation for RemoteMirror {
    fn is_authoritative(&self) -> bool {
        false
    }

    fn current_tick(&self) -> SimulationTick {
        self.tick
    }

    fn submit_input(&mut self, authority: AuthorityId, _input: PlayerInput) {
        debug!(%authority, "mirror ignores local input");
    }

    fn advance(&mut self, clock: &dyn TickClock) -> TickReport {
        let mut report = TickReport::new(self.tick);
        if let Some(update) = self.pending.take() {
            self.adopt(update, clock, &mut report);
            report.tick = self.tick;
        }
        report
    }

    fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.entities.values().map(EntitySnapshot::from).collect()
    }
}

fn overwrite(entity: &mut Entity, snapshot: &EntitySnapshot, tuning: &PlayerTuning) {
    entity.alive = snapshot.alive;
    entity.position = snapshot.position;
    entity.authority = snapshot.owner;
    match (&mut entity.kind, &snapshot.payload) {
        (
            EntityKind::Player(p),
            SnapshotPayload::Player {
                display_name,
                score,
                scale,
            },
        ) => {
            p.display_name.clone_from(display_name);
            p.score = *score;
            p.scale = *scale;
        }
        (EntityKind::Projectile(p), SnapshotPayload::Projectile { heading }) => {
            p.heading = *heading;
        }
        (EntityKind::Hazard(h), SnapshotPayload::Hazard { radius }) => h.radius = *radius,
        (kind, payload) => {
            debug!(entity = %entity.id, ?payload, "kind changed under the same id");
            *kind = mirror_kind(snapshot, payload, tuning);
        }
    }
}

fn mirror_entity(snapshot: &EntitySnapshot, tuning: &PlayerTuning) -> Entity {
    Entity {
        id: snapshot.id,
        position: snapshot.position,
        velocity: Vec2::ZERO,
        authority: snapshot.owner,
        alive: snapshot.alive,
        // Timers stay with the host.
        respawn: Deadline::NotRunning,
        kind: mirror_kind(snapshot, &snapshot.payload, tuning),
    }
}

fn mirror_kind(
    snapshot: &EntitySnapshot,
    payload: &SnapshotPayload,
    tuning: &PlayerTuning,
) -> EntityKind {
    match payload {
        SnapshotPayload::Player {
            display_name,
            score,
            scale,
        } => EntityKind::Player(PlayerState {
            display_name: display_name.clone(),
            score: *score,
            damage_radius: tuning.damage_radius,
            scale: *scale,
            facing: Vec2::UP,
            buttons_previous: Buttons::NONE,
            shoot_cooldown: Deadline::NotRunning,
        }),
        SnapshotPayload::Projectile { heading } => EntityKind::Projectile(ProjectileState {
            owner: snapshot.owner.unwrap_or(AuthorityId(0)),
            lifetime: Deadline::NotRunning,
            heading: *heading,
            radius: 0.0,
        }),
        SnapshotPayload::Hazard { radius } => EntityKind::Hazard(HazardState { radius: *radius }),
    }
}
