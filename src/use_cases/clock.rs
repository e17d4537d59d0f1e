use crate::domain::ports::TickClock;
use crate::domain::timer::{SimulationTick, TickRate};

/// Tick source owned by the scheduler loop; only `advance` moves it.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    tick: SimulationTick,
    rate: TickRate,
}

impl FixedStepClock {
    pub fn new(rate: TickRate) -> Self {
        Self::starting_at(SimulationTick::ZERO, rate)
    }

    pub fn starting_at(tick: SimulationTick, rate: TickRate) -> Self {
        Self { tick, rate }
    }

    pub fn advance(&mut self) -> SimulationTick {
        self.tick = self.tick.next();
        self.tick
    }
}

impl TickClock for FixedStepClock {
    fn current_tick(&self) -> SimulationTick {
        self.tick
    }

    fn tick_rate(&self) -> TickRate {
        self.rate
    }
}
