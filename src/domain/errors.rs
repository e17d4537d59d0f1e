// Domain-level errors for configuration and simulation invariants.

use crate::domain::state::EntityId;
use crate::domain::timer::SimulationTick;
use thiserror::Error;

/// Fatal at startup; the host never starts ticking with one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("spawn point registry is empty; cannot choose a spawn location")]
    EmptySpawnRegistry,
    #[error("tick rate must be non-zero")]
    ZeroTickRate,
    #[error("tick rate {value} exceeds the supported maximum of {max}")]
    TickRateTooHigh { value: u32, max: u32 },
    #[error("failed to read arena config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid arena config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Should never occur while the lifecycle invariants hold. Logged, never user-visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicViolation {
    #[error("{entity} is already dead at tick {tick}; refusing a second death")]
    AlreadyDead { entity: EntityId, tick: SimulationTick },
    #[error("{entity} respawn fired at tick {tick} without a running deadline")]
    RespawnWithoutDeadline { entity: EntityId, tick: SimulationTick },
}
