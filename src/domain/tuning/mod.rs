// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod hazard;
pub mod player;
pub mod projectile;

pub use arena::ArenaBounds;
pub use hazard::HazardTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;

/// Every gameplay knob the host simulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArenaTuning {
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub hazard: HazardTuning,
    pub bounds: ArenaBounds,
}
