use serde::Deserialize;

/// Gameplay tuning for drifting hazards.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Seconds between spawns are drawn uniformly from this range.
    pub min_spawn_delay: f32,
    pub max_spawn_delay: f32,

    /// Drift speed range in units per second.
    pub min_speed: f32,
    pub max_speed: f32,

    /// World-space collision radius.
    pub radius: f32,

    /// Hazards are only spawned when enabled.
    pub enabled: bool,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            min_spawn_delay: 0.5,
            max_spawn_delay: 1.0,
            min_speed: 1.0,
            max_speed: 5.0,
            radius: 1.5,
            enabled: true,
        }
    }
}
