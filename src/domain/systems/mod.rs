// Per-tick simulation systems. Each runs inside one phase of `HostSimulation::advance`.

pub mod authority;
pub mod fire;
pub mod hazards;
pub mod lag_compensation;
pub mod movement;
pub mod projectiles;
