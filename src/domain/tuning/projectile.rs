use serde::Deserialize;

/// Gameplay tuning for projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Travel speed in units per second.
    pub speed: f32,

    /// Lifetime in seconds before the projectile is retired.
    pub life_time: f32,

    /// World-space collision radius.
    pub radius: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 200.0,
            life_time: 3.0,
            radius: 0.5,
        }
    }
}
