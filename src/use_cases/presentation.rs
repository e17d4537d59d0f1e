// Observer running on its own cadence: mirrors the latest published update and turns field
// edges into presentation cues. Reads snapshots only.

use super::clock::FixedStepClock;
use super::mirror::RemoteMirror;
use super::simulation::Simulation;
use super::types::WorldUpdate;
use crate::domain::replication::{ChangeDetector, FieldId, VisualCue};
use crate::domain::state::EntityId;
use crate::domain::timer::TickRate;
use crate::domain::tuning::PlayerTuning;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Cue { entity: EntityId, cue: VisualCue },
    ScoreChanged { entity: EntityId },
    Removed { entity: EntityId },
}

/// Mirror plus change detector; one `refresh` per presentation frame.
pub struct Presenter {
    mirror: RemoteMirror,
    detector: ChangeDetector,
    clock: FixedStepClock,
}

impl Presenter {
    pub fn new(tuning: PlayerTuning, tick_rate: TickRate) -> Self {
        Self {
            mirror: RemoteMirror::new(tuning),
            detector: ChangeDetector::new(),
            clock: FixedStepClock::new(tick_rate),
        }
    }

    /// Refreshes may outnumber ticks; an unchanged tick yields no events.
    pub fn refresh(&mut self, latest: WorldUpdate) -> Vec<PresentationEvent> {
        self.mirror.receive(latest);
        self.mirror.advance(&self.clock);

        let snapshots = self.mirror.snapshots();
        let mut events = Vec::new();
        for snapshot in &snapshots {
            for change in self.detector.detect_changes(snapshot) {
                if let Some(cue) = VisualCue::from_change(&change) {
                    events.push(PresentationEvent::Cue {
                        entity: snapshot.id,
                        cue,
                    });
                } else if change.field == FieldId::Score {
                    events.push(PresentationEvent::ScoreChanged {
                        entity: snapshot.id,
                    });
                }
            }
        }

        let removed = self
            .detector
            .sweep(|id| snapshots.iter().any(|s| s.id == id));
        events.extend(
            removed
                .into_iter()
                .map(|entity| PresentationEvent::Removed { entity }),
        );
        events
    }
}

pub async fn presentation_task(
    mut snapshot_rx: watch::Receiver<WorldUpdate>,
    mut presenter: Presenter,
    refresh_interval: Duration,
) {
    let mut interval = tokio::time::interval(refresh_interval);

    loop {
        interval.tick().await;
        if snapshot_rx.has_changed().is_err() {
            info!("snapshot channel closed; presentation task exiting");
            break;
        }

        let latest = snapshot_rx.borrow_and_update().clone();
        for event in presenter.refresh(latest) {
            debug!(?event, "presentation");
        }
    }
}
