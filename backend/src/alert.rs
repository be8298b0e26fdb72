//! Countdown-confirmation alert workflow.
//!
//! Watches phase changes. An `Alert` gives the user `confirm_window` to
//! dismiss it; otherwise the detector is escalated to `Emergency` and one
//! [`EmergencyAlert`] is sent out.

use crate::detector::Detector;
use crate::model::{ClientCommand, DetectorState, EmergencyAlert, PhaseChange};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};

/// Applies a confirmation-UI command to the detector.
pub fn apply_command(detector: &Detector, command: ClientCommand) {
    match command {
        ClientCommand::Dismiss => {
            info!("user dismissed the alert");
            detector.force_state(DetectorState::Normal);
        }
        ClientCommand::Escalate => {
            warn!("user requested emergency assistance");
            detector.force_state(DetectorState::Emergency);
        }
        ClientCommand::Reset => {
            info!("alert cleared");
            detector.reset();
        }
    }
}

/// Longest confirmation window accepted; longer ones are cut to this.
pub const MAX_CONFIRM_WINDOW: Duration = Duration::from_secs(3600);

fn arm(confirm_window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(confirm_window)
        .unwrap_or_else(|| now + MAX_CONFIRM_WINDOW)
}

pub struct AlertWorkflow {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl AlertWorkflow {
    /// Subscribes to `detector` and starts the workflow task. Emergency
    /// alerts are delivered on `alerts`. `confirm_window` is capped at
    /// [`MAX_CONFIRM_WINDOW`].
    pub fn spawn(
        detector: Detector,
        confirm_window: Duration,
        alerts: mpsc::Sender<EmergencyAlert>,
    ) -> Self {
        let shutdown = Arc::new(Notify::new());
        let confirm_window = confirm_window.min(MAX_CONFIRM_WINDOW);
        let events = detector.subscribe();
        let task = tokio::spawn(workflow_loop(
            detector,
            events,
            confirm_window,
            alerts,
            shutdown.clone(),
        ));
        Self { shutdown, task }
    }

    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            warn!(error = %e, "alert workflow ended abnormally");
        }
    }
}

async fn workflow_loop(
    detector: Detector,
    mut events: broadcast::Receiver<PhaseChange>,
    confirm_window: Duration,
    alerts: mpsc::Sender<EmergencyAlert>,
    shutdown: Arc<Notify>,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => break,

            event = events.recv() => match event {
                Ok(change) => match change.to {
                    DetectorState::Alert => {
                        info!(
                            window_secs = confirm_window.as_secs(),
                            "possible fall detected, waiting for confirmation"
                        );
                        deadline = Some(arm(confirm_window));
                    }
                    DetectorState::Emergency => {
                        deadline = None;
                        let alert = EmergencyAlert::from_snapshot(&change.snapshot);
                        error!(
                            id = %alert.id,
                            location = %alert.location,
                            impact_peak = alert.impact_peak,
                            "emergency alert raised"
                        );
                        if alerts.send(alert).await.is_err() {
                            warn!("no one is listening for emergency alerts");
                        }
                    }
                    _ => deadline = None,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "alert workflow fell behind on phase changes");
                    // Re-sync with the current phase so a missed Alert still counts down
                    match detector.phase() {
                        DetectorState::Alert if deadline.is_none() => {
                            deadline = Some(arm(confirm_window));
                        }
                        DetectorState::Alert | DetectorState::Emergency => {}
                        _ => deadline = None,
                    }
                }
                Err(RecvError::Closed) => break,
            },

            // After events, so a dismissal already queued disarms the countdown first
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                if detector.escalate_if(DetectorState::Alert, DetectorState::Emergency) {
                    warn!("alert not dismissed in time, escalating");
                } else {
                    info!("countdown expired after the alert was cleared");
                }
            }
        }
    }
}
