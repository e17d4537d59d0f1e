// Domain-level simulation entities and input/snapshot types.

use crate::domain::collision::{ColliderRecord, CollisionMask};
use crate::domain::math::Vec2;
use crate::domain::timer::Deadline;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

/// A participant permitted to drive an entity's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorityId(pub u64);

impl fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const FIRE: Buttons = Buttons(1 << 0);

    pub fn contains(self, button: Buttons) -> bool {
        self.0 & button.0 == button.0 && button.0 != 0
    }

    /// Rising edge: held now but not in `previous`.
    pub fn was_pressed(self, previous: Buttons, button: Buttons) -> bool {
        self.contains(button) && !previous.contains(button)
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

/// Immutable per-tick intent from one participant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInput {
    pub horizontal: f32,
    pub vertical: f32,
    pub buttons: Buttons,
}

impl PlayerInput {
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.horizontal, self.vertical)
    }

    /// Clamps axes into [-1, 1]; rejects NaN/inf.
    pub fn sanitized(mut self) -> Option<PlayerInput> {
        if !self.horizontal.is_finite() || !self.vertical.is_finite() {
            return None;
        }

        self.horizontal = self.horizontal.clamp(-1.0, 1.0);
        self.vertical = self.vertical.clamp(-1.0, 1.0);

        Some(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub display_name: String,
    pub score: u32,
    pub damage_radius: f32,
    pub scale: f32,

    // Fire-control state (not replicated).
    pub facing: Vec2,
    pub buttons_previous: Buttons,
    pub shoot_cooldown: Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileState {
    pub owner: AuthorityId,
    pub lifetime: Deadline,
    pub heading: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardState {
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Projectile(ProjectileState),
    Hazard(HazardState),
}

/// Lifecycle derived from the alive flag and the respawn deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Alive,
    // Respawn timer not running; stays here until something schedules one.
    Dead,
    Respawning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub authority: Option<AuthorityId>,
    pub alive: bool,
    pub respawn: Deadline,
    pub kind: EntityKind,
}

impl Entity {
    pub fn lifecycle(&self) -> Lifecycle {
        match (self.alive, self.respawn.is_running()) {
            (true, _) => Lifecycle::Alive,
            (false, true) => Lifecycle::Respawning,
            (false, false) => Lifecycle::Dead,
        }
    }

    pub fn layer(&self) -> CollisionMask {
        match self.kind {
            EntityKind::Player(_) => CollisionMask::PARTICIPANT,
            EntityKind::Projectile(_) => CollisionMask::PROJECTILE,
            EntityKind::Hazard(_) => CollisionMask::HAZARD,
        }
    }

    pub fn collider(&self) -> ColliderRecord {
        let radius = match &self.kind {
            EntityKind::Player(p) => p.damage_radius,
            EntityKind::Projectile(p) => p.radius,
            EntityKind::Hazard(h) => h.radius,
        };

        ColliderRecord {
            entity: self.id,
            position: self.position,
            radius,
            layer: self.layer(),
        }
    }

    pub fn player(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn projectile(&self) -> Option<&ProjectileState> {
        match &self.kind {
            EntityKind::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self.kind, EntityKind::Projectile(_))
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self.kind, EntityKind::Hazard(_))
    }
}

/// Replicated, read-only view of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub alive: bool,
    pub position: Vec2,
    pub owner: Option<AuthorityId>,
    pub payload: SnapshotPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotPayload {
    Player {
        display_name: String,
        score: u32,
        scale: f32,
    },
    Projectile {
        heading: Vec2,
    },
    Hazard {
        radius: f32,
    },
}

impl From<&Entity> for EntitySnapshot {
    fn from(e: &Entity) -> Self {
        let payload = match &e.kind {
            EntityKind::Player(p) => SnapshotPayload::Player {
                display_name: p.display_name.clone(),
                score: p.score,
                scale: p.scale,
            },
            EntityKind::Projectile(p) => SnapshotPayload::Projectile { heading: p.heading },
            EntityKind::Hazard(h) => SnapshotPayload::Hazard { radius: h.radius },
        };

        Self {
            id: e.id,
            alive: e.alive,
            position: e.position,
            owner: e.authority,
            payload,
        }
    }
}
