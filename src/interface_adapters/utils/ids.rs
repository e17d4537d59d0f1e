use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter handing out ids from 1 upwards.
pub struct IdSequence(AtomicU64);

impl IdSequence {
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

// Kept apart so log correlation ids never leak into the wire-visible player ids.
static CONNECTIONS: IdSequence = IdSequence::new();
static PLAYERS: IdSequence = IdSequence::new();

pub fn next_connection_id() -> u64 {
    CONNECTIONS.next()
}

pub fn next_player_id() -> u64 {
    PLAYERS.next()
}
