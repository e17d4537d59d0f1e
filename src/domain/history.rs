// Bounded per-tick collider history backing lag-compensated queries.

use crate::domain::collision::{ColliderRecord, CollisionMask};
use crate::domain::math::Vec2;
use crate::domain::ports::WorldHistory;
use crate::domain::timer::SimulationTick;
use std::collections::VecDeque;

/// Ring buffer of collider frames, oldest first.
#[derive(Debug)]
pub struct SnapshotHistory {
    capacity: usize,
    frames: VecDeque<(SimulationTick, Vec<ColliderRecord>)>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn oldest_tick(&self) -> Option<SimulationTick> {
        self.frames.front().map(|(tick, _)| *tick)
    }

    pub fn newest_tick(&self) -> Option<SimulationTick> {
        self.frames.back().map(|(tick, _)| *tick)
    }

    // Latest frame at or before `tick`; the oldest frame when `tick` predates the buffer.
    fn frame_at(&self, tick: SimulationTick) -> Option<&[ColliderRecord]> {
        self.frames
            .iter()
            .rev()
            .find(|(recorded, _)| *recorded <= tick)
            .or_else(|| self.frames.front())
            .map(|(_, colliders)| colliders.as_slice())
    }
}

impl WorldHistory for SnapshotHistory {
    fn record(&mut self, tick: SimulationTick, colliders: Vec<ColliderRecord>) {
        // Re-recording a tick replaces it; ticks never go backwards otherwise.
        if self.newest_tick() == Some(tick) {
            self.frames.pop_back();
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back((tick, colliders));
    }

    fn colliders_within(
        &self,
        tick: SimulationTick,
        origin: Vec2,
        radius: f32,
        mask: CollisionMask,
    ) -> Vec<ColliderRecord> {
        let Some(frame) = self.frame_at(tick) else {
            return Vec::new();
        };

        frame
            .iter()
            .filter(|c| c.layer.intersects(mask) && c.overlaps(origin, radius))
            .copied()
            .collect()
    }
}
