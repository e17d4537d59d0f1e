use super::clock::FixedStepClock;
use super::simulation::{HostSimulation, Simulation};
use super::types::{GameEvent, ServerState, TickReport, WorldUpdate};
use crate::domain::ports::TickClock;
use crate::domain::timer::TickRate;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Runtime knobs for the scheduler loop (not gameplay tuning).
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub tick_rate: TickRate,
    pub match_start_delay: Duration,
}

/// Outbound channels the world task publishes on.
pub struct WorldChannels {
    // Every tick, for the wire serializer.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    // Latest tick only, for observers on their own cadence.
    pub snapshot_tx: watch::Sender<WorldUpdate>,
    pub server_state_tx: watch::Sender<ServerState>,
}

pub async fn world_task(
    mut sim: HostSimulation,
    mut input_rx: mpsc::Receiver<GameEvent>,
    channels: WorldChannels,
    settings: LoopSettings,
) {
    let mut clock = FixedStepClock::new(settings.tick_rate);

    let in_seconds = settings.match_start_delay.as_secs() as u32;
    let _ = channels
        .server_state_tx
        .send(ServerState::MatchStarting { in_seconds });
    tokio::time::sleep(settings.match_start_delay).await;

    // Joins that arrived during the countdown are placed at match start.
    if !drain_events(&mut sim, &mut input_rx) {
        info!("input channel closed before match start; world task exiting");
        return;
    }
    sim.start_match(&clock);
    let _ = channels.server_state_tx.send(ServerState::MatchRunning);

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(settings.tick_rate.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;

        if !drain_events(&mut sim, &mut input_rx) {
            info!(tick = %clock.current_tick(), "input channel closed; world task exiting");
            break;
        }

        clock.advance();
        let report = sim.advance(&clock);
        log_report(&report);

        let update = sim.world_update();
        let _ = channels.snapshot_tx.send(update.clone());
        if channels.world_tx.send(update).is_err() {
            // No subscribers yet; nothing to do.
            debug!("world update dropped; no receivers");
        }
    }
}

// Applies queued events in arrival order. Returns false once every sender is gone.
fn drain_events(sim: &mut HostSimulation, input_rx: &mut mpsc::Receiver<GameEvent>) -> bool {
    loop {
        match input_rx.try_recv() {
            Ok(GameEvent::Join {
                player_id,
                display_name,
            }) => {
                info!(%player_id, "player joined");
                sim.join(player_id, display_name);
            }
            Ok(GameEvent::Leave { player_id }) => sim.leave(player_id),
            Ok(GameEvent::Input { player_id, input }) => sim.submit_input(player_id, input),
            Ok(GameEvent::Latency { player_id, rtt }) => {
                debug!(%player_id, rtt_ms = rtt.as_millis() as u64, "latency sample");
                sim.set_latency(player_id, rtt);
            }
            Err(mpsc::error::TryRecvError::Empty) => return true,
            Err(mpsc::error::TryRecvError::Disconnected) => return false,
        }
    }
}

fn log_report(report: &TickReport) {
    if report.violations > 0 {
        warn!(tick = %report.tick, violations = report.violations, "tick had logic violations");
    }
    if report.is_quiet() {
        return;
    }
    debug!(
        tick = %report.tick,
        lifecycle = report.lifecycle.len(),
        fired = report.fired.len(),
        expired = report.expired.len(),
        hazards_spawned = report.hazards_spawned.len(),
        hazards_removed = report.hazards_removed.len(),
        "tick processed"
    );
}
