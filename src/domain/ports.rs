use crate::domain::collision::{ColliderRecord, CollisionMask};
use crate::domain::math::Vec2;
use crate::domain::state::Entity;
use crate::domain::timer::{SimulationTick, TickRate};

// Port for the fixed-step tick source driving the host.
pub trait TickClock: Send + Sync {
    fn current_tick(&self) -> SimulationTick;
    fn tick_rate(&self) -> TickRate;

    fn delta_time(&self) -> f32 {
        self.tick_rate().delta_time()
    }
}

// Port for the per-tick collider history used by lag-compensated queries.
pub trait WorldHistory: Send {
    /// Stores the collider set as it stood after integration at `tick`.
    fn record(&mut self, tick: SimulationTick, colliders: Vec<ColliderRecord>);

    /// Colliders on `mask` overlapping the circle at `origin`, as of `tick`.
    fn colliders_within(
        &self,
        tick: SimulationTick,
        origin: Vec2,
        radius: f32,
        mask: CollisionMask,
    ) -> Vec<ColliderRecord>;
}

// Port for the injected physics integration step.
pub trait PhysicsStep: Send {
    fn integrate(&self, entity: &mut Entity, dt: f32);
}

// Port for collision notices shown by a debug overlay.
pub trait DebugSink: Send {
    fn push(&self, line: &str);
}
