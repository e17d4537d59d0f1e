// Use-case level inputs/outputs for the game loop.

use crate::domain::scoreboard::RankEntry;
use crate::domain::state::{AuthorityId, EntityId, EntitySnapshot, PlayerInput};
use crate::domain::systems::authority::LifecycleEvent;
use crate::domain::timer::SimulationTick;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        player_id: AuthorityId,
        display_name: String,
    },
    Leave {
        player_id: AuthorityId,
    },
    Input {
        player_id: AuthorityId,
        input: PlayerInput,
    },
    // Round-trip estimate measured by the transport.
    Latency {
        player_id: AuthorityId,
        rtt: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    Lobby,
    MatchStarting { in_seconds: u32 },
    MatchRunning,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldUpdate {
    pub tick: u64,
    pub entities: Vec<EntitySnapshot>,
    pub scoreboard: Vec<RankEntry>,
}

/// What one `advance` did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: SimulationTick,
    pub lifecycle: Vec<LifecycleEvent>,
    pub fired: Vec<EntityId>,
    pub expired: Vec<EntityId>,
    pub hazards_spawned: Vec<EntityId>,
    pub hazards_removed: Vec<EntityId>,
    // Mirror only: deaths seen in adopted snapshots.
    pub deaths_observed: Vec<EntityId>,
    pub violations: usize,
}

impl TickReport {
    pub fn new(tick: SimulationTick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.lifecycle.is_empty()
            && self.fired.is_empty()
            && self.expired.is_empty()
            && self.hazards_spawned.is_empty()
            && self.hazards_removed.is_empty()
            && self.deaths_observed.is_empty()
            && self.violations == 0
    }
}
