// Collision layers, collider records and query hits.

use crate::domain::state::EntityId;
use crate::domain::math::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Opaque layer bits distinguishing participant/projectile/hazard collidables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const NONE: CollisionMask = CollisionMask(0);
    pub const PARTICIPANT: CollisionMask = CollisionMask(1 << 0);
    pub const PROJECTILE: CollisionMask = CollisionMask(1 << 1);
    pub const HAZARD: CollisionMask = CollisionMask(1 << 2);
    pub const ALL: CollisionMask = CollisionMask(u32::MAX);

    pub fn intersects(self, other: CollisionMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionMask {
    type Output = CollisionMask;

    fn bitor(self, rhs: CollisionMask) -> CollisionMask {
        CollisionMask(self.0 | rhs.0)
    }
}

/// Where a collidable was at one tick. Recorded into the world history every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderRecord {
    pub entity: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub layer: CollisionMask,
}

impl ColliderRecord {
    /// Circle/circle overlap against a query region.
    pub fn overlaps(&self, origin: Vec2, radius: f32) -> bool {
        let reach = radius + self.radius;
        (self.position - origin).length_squared() <= reach * reach
    }
}

/// Ephemeral query result; recomputed on every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    pub target: EntityId,
    pub distance: f32,
    pub contact_point: Vec2,
}

impl CollisionHit {
    pub fn from_record(origin: Vec2, record: &ColliderRecord) -> CollisionHit {
        let offset = record.position - origin;
        let distance = offset.length();
        // Closest point of the collider's circle to the origin (the origin itself when inside).
        let contact_point = if distance > record.radius {
            origin + offset.normalized() * (distance - record.radius)
        } else {
            origin
        };

        CollisionHit {
            target: record.entity,
            distance,
            contact_point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f32, radius: f32) -> ColliderRecord {
        ColliderRecord {
            entity: EntityId(1),
            position: Vec2::new(x, 0.0),
            radius,
            layer: CollisionMask::PROJECTILE,
        }
    }

    #[test]
    fn when_circles_touch_then_they_overlap() {
        assert!(record(3.0, 1.0).overlaps(Vec2::ZERO, 2.0));
        assert!(!record(3.1, 1.0).overlaps(Vec2::ZERO, 2.0));
    }

    #[test]
    fn when_collider_is_outside_then_contact_point_sits_on_its_edge() {
        let hit = CollisionHit::from_record(Vec2::ZERO, &record(3.0, 1.0));
        assert_eq!(hit.distance, 3.0);
        assert_eq!(hit.contact_point, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn when_masks_share_no_bits_then_they_do_not_intersect() {
        let mask = CollisionMask::PROJECTILE | CollisionMask::HAZARD;
        assert!(mask.intersects(CollisionMask::HAZARD));
        assert!(!mask.intersects(CollisionMask::PARTICIPANT));
        assert!(!CollisionMask::NONE.intersects(CollisionMask::ALL));
    }
}
