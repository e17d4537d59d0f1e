// Domain layer: simulation types, rules and the ports they are driven through.

pub mod collision;
pub mod errors;
pub mod history;
pub mod math;
pub mod ports;
pub mod replication;
pub mod scoreboard;
pub mod spawner;
pub mod state;
pub mod systems;
pub mod timer;
pub mod tuning;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use collision::{CollisionHit, CollisionMask};
pub use errors::{ConfigError, LogicViolation};
pub use math::Vec2;
pub use state::{
    AuthorityId, Buttons, Entity, EntityId, EntityKind, EntitySnapshot, PlayerInput,
    SnapshotPayload,
};
pub use timer::{Deadline, SimulationTick, TickRate};
pub use world::World;
