use serde::Deserialize;

/// Gameplay tuning for participant ships.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Acceleration applied to the input direction, in units per second squared.
    pub movement_speed: f32,

    /// Velocity cap in units per second.
    pub max_speed: f32,

    /// Radius of the lag-compensated damage query around the ship.
    pub damage_radius: f32,

    /// Seconds between being hit and coming back.
    pub respawn_seconds: f32,

    /// Minimum seconds between two shots.
    pub shot_delay: f32,

    /// Ship scale bounds and growth per point of score.
    pub min_scale: f32,
    pub max_scale: f32,
    pub scale_factor: f32,
}

impl PlayerTuning {
    pub fn scale_for(&self, score: u32) -> f32 {
        (self.min_scale + score as f32 * self.scale_factor).clamp(self.min_scale, self.max_scale)
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            movement_speed: 2000.0,
            max_speed: 200.0,
            damage_radius: 2.5,
            respawn_seconds: 4.0,
            shot_delay: 0.2,
            min_scale: 5.0,
            max_scale: 20.0,
            scale_factor: 2.0,
        }
    }
}
