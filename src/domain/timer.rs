// Tick counters and deadline arithmetic.
//
// Everything here is pure: identical (duration, tick, rate) inputs always give the same
// deadline, which keeps host runs and replays in lockstep.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// One fixed-step advance of the host simulation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimulationTick(pub u64);

impl SimulationTick {
    pub const ZERO: SimulationTick = SimulationTick(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> SimulationTick {
        SimulationTick(self.0 + 1)
    }

    pub fn offset(self, ticks: u64) -> SimulationTick {
        SimulationTick(self.0.saturating_add(ticks))
    }

    pub fn rewind(self, ticks: u64) -> SimulationTick {
        SimulationTick(self.0.saturating_sub(ticks))
    }
}

impl fmt::Display for SimulationTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed simulation rate in ticks per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(NonZeroU32);

impl TickRate {
    pub const DEFAULT: TickRate = TickRate(NonZeroU32::new(60).unwrap());

    pub fn new(ticks_per_second: u32) -> Option<TickRate> {
        NonZeroU32::new(ticks_per_second).map(TickRate)
    }

    pub fn ticks_per_second(self) -> u32 {
        self.0.get()
    }

    /// Seconds covered by one tick.
    pub fn delta_time(self) -> f32 {
        1.0 / self.0.get() as f32
    }

    /// Wall-clock length of one tick, for the scheduler loop.
    pub fn interval(self) -> Duration {
        // Never zero: a zero period panics `tokio::time::interval`.
        Duration::from_secs_f64(1.0 / self.0.get() as f64).max(Duration::from_nanos(1))
    }

    /// Whole ticks needed to cover `seconds`, rounded up.
    pub fn ticks_for(self, seconds: f32) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.0.get() as f32).ceil() as u64
    }
}

impl Default for TickRate {
    fn default() -> Self {
        TickRate::DEFAULT
    }
}

/// A tick at which a scheduled condition becomes true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deadline {
    #[default]
    NotRunning,
    At(SimulationTick),
}

impl Deadline {
    pub fn is_running(self) -> bool {
        matches!(self, Deadline::At(_))
    }

    pub fn tick(self) -> Option<SimulationTick> {
        match self {
            Deadline::At(tick) => Some(tick),
            Deadline::NotRunning => None,
        }
    }
}

/// Schedules a deadline `duration_seconds` from `current`.
pub fn start(duration_seconds: f32, current: SimulationTick, rate: TickRate) -> Deadline {
    Deadline::At(current.offset(rate.ticks_for(duration_seconds)))
}

/// True iff the deadline is running and `current` has reached it.
pub fn is_expired(deadline: Deadline, current: SimulationTick) -> bool {
    match deadline {
        Deadline::At(at) => current >= at,
        Deadline::NotRunning => false,
    }
}

/// Permissive variant for cooldowns: never started counts as elapsed.
pub fn is_expired_or_not_running(deadline: Deadline, current: SimulationTick) -> bool {
    match deadline {
        Deadline::At(at) => current >= at,
        Deadline::NotRunning => true,
    }
}

pub fn remaining_ticks(deadline: Deadline, current: SimulationTick) -> Option<u64> {
    deadline.tick().map(|at| at.get().saturating_sub(current.get()))
}
