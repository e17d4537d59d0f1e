// Overlap queries evaluated against the world as a participant saw it.

use crate::domain::collision::{CollisionHit, CollisionMask};
use crate::domain::math::Vec2;
use crate::domain::ports::{TickClock, WorldHistory};
use crate::domain::state::AuthorityId;
use crate::domain::timer::{SimulationTick, TickRate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// How far back a participant's queries are rewound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompensationPolicy {
    /// Always query the present tick.
    None,
    /// Rewind every participant by the same number of ticks.
    FixedTicks { ticks: u64 },
    /// Rewind by the participant's round trip plus the client interpolation delay.
    RoundTrip {
        interpolation_ticks: u64,
        max_rewind_ticks: u64,
    },
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        CompensationPolicy::RoundTrip {
            interpolation_ticks: 2,
            max_rewind_ticks: 30,
        }
    }
}

/// Latest round-trip estimate per participant.
#[derive(Debug, Clone, Default)]
pub struct LatencyTable {
    rtt: BTreeMap<AuthorityId, Duration>,
}

impl LatencyTable {
    pub fn set(&mut self, authority: AuthorityId, rtt: Duration) {
        self.rtt.insert(authority, rtt);
    }

    pub fn get(&self, authority: AuthorityId) -> Option<Duration> {
        self.rtt.get(&authority).copied()
    }

    pub fn remove(&mut self, authority: AuthorityId) {
        self.rtt.remove(&authority);
    }
}

#[derive(Debug, Clone, Default)]
pub struct LagCompensation {
    policy: CompensationPolicy,
    latency: LatencyTable,
}

impl LagCompensation {
    pub fn new(policy: CompensationPolicy) -> Self {
        Self {
            policy,
            latency: LatencyTable::default(),
        }
    }

    pub fn policy(&self) -> CompensationPolicy {
        self.policy
    }

    pub fn latency(&self) -> &LatencyTable {
        &self.latency
    }

    pub fn latency_mut(&mut self) -> &mut LatencyTable {
        &mut self.latency
    }

    pub fn rewind_ticks(&self, authority: Option<AuthorityId>, rate: TickRate) -> u64 {
        match self.policy {
            CompensationPolicy::None => 0,
            CompensationPolicy::FixedTicks { ticks } => ticks,
            CompensationPolicy::RoundTrip {
                interpolation_ticks,
                max_rewind_ticks,
            } => {
                // Host-owned entities (no authority) have no display lag to undo.
                let Some(rtt) = authority.and_then(|a| self.latency.get(a)) else {
                    return 0;
                };
                let rtt_ticks = rate.ticks_for(rtt.as_secs_f32());
                (rtt_ticks + interpolation_ticks).min(max_rewind_ticks)
            }
        }
    }

    pub fn compensated_tick<C: TickClock + ?Sized>(
        &self,
        authority: Option<AuthorityId>,
        clock: &C,
    ) -> SimulationTick {
        let current = clock.current_tick();
        current.rewind(self.rewind_ticks(authority, clock.tick_rate()))
    }

    /// Colliders on `mask` overlapping the circle, nearest first.
    ///
    /// Authority-agnostic: callers filter self-owned hits themselves.
    pub fn query<H, C>(
        &self,
        history: &H,
        clock: &C,
        origin: Vec2,
        radius: f32,
        authority: Option<AuthorityId>,
        mask: CollisionMask,
    ) -> Vec<CollisionHit>
    where
        H: WorldHistory + ?Sized,
        C: TickClock + ?Sized,
    {
        let tick = self.compensated_tick(authority, clock);
        let mut hits: Vec<CollisionHit> = history
            .colliders_within(tick, origin, radius, mask)
            .iter()
            .map(|record| CollisionHit::from_record(origin, record))
            .collect();
        sort_hits(&mut hits);
        hits
    }
}

/// Ascending distance; equal distances fall back to entity id.
pub fn sort_hits(hits: &mut [CollisionHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.target.cmp(&b.target))
    });
}
