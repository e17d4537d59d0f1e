use crate::domain::ports::PhysicsStep;
use crate::domain::state::{Entity, PlayerInput};
use crate::domain::tuning::{ArenaBounds, PlayerTuning};

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub movement_speed: f32, // units/s^2
    pub max_speed: f32,      // units/s
    pub bounds: ArenaBounds,
}

impl MovementConfig {
    pub fn new(tuning: &PlayerTuning, bounds: ArenaBounds) -> Self {
        Self {
            movement_speed: tuning.movement_speed,
            max_speed: tuning.max_speed,
            bounds,
        }
    }
}

/// Sets the ship's velocity from this tick's input. Position is left to the physics step.
pub fn steer(e: &mut Entity, input: &PlayerInput, dt: f32, cfg: MovementConfig) {
    // velocity = direction * movement_speed * dt, capped at max_speed
    let direction = input.direction().normalized();
    e.velocity = (direction * (cfg.movement_speed * dt)).clamp_length(cfg.max_speed);
}

/// Default physics: explicit Euler over the entity's velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicStep;

impl PhysicsStep for KinematicStep {
    fn integrate(&self, entity: &mut Entity, dt: f32) {
        entity.position += entity.velocity * dt;
    }
}

/// Moves an entity that left the arena to the opposite edge.
pub fn wrap_to_bounds(e: &mut Entity, bounds: ArenaBounds) {
    let mut p = e.position;
    if bounds.contains(p) {
        return;
    }

    if p.x.abs() > bounds.half_width {
        p.x = -p.x.signum() * bounds.half_width;
    }
    if p.y.abs() > bounds.half_height {
        p.y = -p.y.signum() * bounds.half_height;
    }

    // Pull slightly inwards so the next tick does not wrap straight back.
    p -= p.normalized() * ArenaBounds::EDGE_INSET;
    e.position = p;
}
