use std::sync::{Arc, Mutex};

use crate::domain::ports::{DebugSink, TickClock};
use crate::domain::timer::{SimulationTick, TickRate};

// Fixed tick source for deterministic simulation tests.
#[derive(Clone, Copy)]
pub(crate) struct FixedClock {
    pub(crate) tick: SimulationTick,
    pub(crate) rate: TickRate,
}

impl FixedClock {
    pub(crate) fn at(tick: u64) -> Self {
        Self {
            tick: SimulationTick(tick),
            rate: TickRate::DEFAULT,
        }
    }
}

impl TickClock for FixedClock {
    fn current_tick(&self) -> SimulationTick {
        self.tick
    }

    fn tick_rate(&self) -> TickRate {
        self.rate
    }
}

// Debug sink that keeps every line so tests can inspect collision notices.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink mutex poisoned").clone()
    }
}

impl DebugSink for RecordingSink {
    fn push(&self, line: &str) {
        self.lines
            .lock()
            .expect("sink mutex poisoned")
            .push(line.to_string());
    }
}
