// Edge-triggered diffs of replicated fields, read on the presentation cadence.
//
// Observer only: nothing here writes back into the world.

use crate::domain::math::Vec2;
use crate::domain::state::{EntityId, EntitySnapshot, SnapshotPayload};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Alive,
    Position,
    Score,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Vec2(Vec2),
    U32(u32),
    F32(f32),
}

/// Reads one tracked field; `None` when the entity kind has no such field.
type FieldReader = fn(&EntitySnapshot) -> Option<FieldValue>;

pub const TRACKED_FIELDS: &[(FieldId, FieldReader)] = &[
    (FieldId::Alive, |s| Some(FieldValue::Bool(s.alive))),
    (FieldId::Position, |s| Some(FieldValue::Vec2(s.position))),
    (FieldId::Score, |s| match s.payload {
        SnapshotPayload::Player { score, .. } => Some(FieldValue::U32(score)),
        _ => None,
    }),
    (FieldId::Scale, |s| match s.payload {
        SnapshotPayload::Player { scale, .. } => Some(FieldValue::F32(scale)),
        _ => None,
    }),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldChange {
    pub field: FieldId,
    pub previous: FieldValue,
    pub current: FieldValue,
}

/// Presentation-only reaction to an alive edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualCue {
    Spawned,
    Destroyed,
}

impl VisualCue {
    pub fn from_change(change: &FieldChange) -> Option<VisualCue> {
        match (change.field, change.previous, change.current) {
            (FieldId::Alive, FieldValue::Bool(false), FieldValue::Bool(true)) => {
                Some(VisualCue::Spawned)
            }
            (FieldId::Alive, FieldValue::Bool(true), FieldValue::Bool(false)) => {
                Some(VisualCue::Destroyed)
            }
            _ => None,
        }
    }
}

/// Retains the last observed snapshot per entity.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: BTreeMap<EntityId, EntitySnapshot>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `current` against the retained copy and retains `current`.
    ///
    /// The first observation of an entity is a baseline and yields nothing.
    pub fn detect_changes(&mut self, current: &EntitySnapshot) -> Changes {
        let previous = self.previous.insert(current.id, current.clone());
        Changes {
            previous,
            current: current.clone(),
            next_field: 0,
        }
    }

    pub fn forget(&mut self, id: EntityId) -> bool {
        self.previous.remove(&id).is_some()
    }

    /// Forgets every entity `still_present` rejects; returns the forgotten ids.
    pub fn sweep(&mut self, still_present: impl Fn(EntityId) -> bool) -> Vec<EntityId> {
        let gone: Vec<EntityId> = self
            .previous
            .keys()
            .copied()
            .filter(|id| !still_present(*id))
            .collect();
        for id in &gone {
            self.previous.remove(id);
        }
        gone
    }

    pub fn tracked(&self) -> usize {
        self.previous.len()
    }
}

/// Lazy walk over the tracked-field table; owns both sides of the comparison.
#[derive(Debug)]
pub struct Changes {
    previous: Option<EntitySnapshot>,
    current: EntitySnapshot,
    next_field: usize,
}

impl Iterator for Changes {
    type Item = FieldChange;

    fn next(&mut self) -> Option<FieldChange> {
        let previous = self.previous.as_ref()?;

        while let Some((field, read)) = TRACKED_FIELDS.get(self.next_field) {
            self.next_field += 1;
            if let (Some(before), Some(after)) = (read(previous), read(&self.current)) {
                if before != after {
                    return Some(FieldChange {
                        field: *field,
                        previous: before,
                        current: after,
                    });
                }
            }
        }
        None
    }
}
