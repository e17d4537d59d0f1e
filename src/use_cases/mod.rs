// Use cases layer: tick orchestration and observers for the arena host.

pub mod clock;
pub mod debug;
pub mod game;
pub mod mirror;
pub mod presentation;
pub mod simulation;
pub mod types;

pub use clock::FixedStepClock;
pub use mirror::RemoteMirror;
pub use simulation::{HostSettings, HostSimulation, Simulation};
pub use types::{GameEvent, ServerState, TickReport, WorldUpdate};
