use crate::domain::math::Vec2;
use serde::Deserialize;

/// Half extents of the playable area, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaBounds {
    pub half_width: f32,
    pub half_height: f32,
}

impl ArenaBounds {
    // Nudge applied after wrapping so an entity does not bounce between edges.
    pub const EDGE_INSET: f32 = 0.1;

    pub fn contains(&self, p: Vec2) -> bool {
        p.x.abs() < self.half_width && p.y.abs() < self.half_height
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            half_width: 50.0,
            half_height: 50.0,
        }
    }
}
