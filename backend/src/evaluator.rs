//! Fixed-cadence evaluator task.

use crate::detector::Detector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Default evaluation cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
/// Shortest cadence the loop will run at.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

pub struct Evaluator;

impl Evaluator {
    /// Spawns the loop on the current tokio runtime. The first tick runs
    /// immediately. A zero `period` is raised to [`MIN_TICK_INTERVAL`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(detector: Detector, period: Duration) -> EvaluatorHandle {
        let period = period.max(MIN_TICK_INTERVAL);
        let shutdown = Arc::new(Notify::new());
        let running = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(evaluator_loop(
            detector,
            period,
            shutdown.clone(),
            running.clone(),
        ));

        info!(period_ms = period.as_millis() as u64, "evaluator started");
        EvaluatorHandle {
            shutdown,
            running,
            task,
        }
    }
}

async fn evaluator_loop(
    detector: Detector,
    period: Duration,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => break,

            _ = ticker.tick() => {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                detector.tick(Instant::now().into_std());
            }
        }
    }

    running.store(false, Ordering::Release);
    info!("evaluator stopped");
}

/// Owner of the running evaluator. Dropping it leaves the loop running;
/// call [`EvaluatorHandle::stop`] to end it.
pub struct EvaluatorHandle {
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl EvaluatorHandle {
    /// Requests shutdown. No tick starts after this returns; a tick already
    /// in progress completes.
    pub fn cancel(&self) {
        self.running.store(false, Ordering::Release);
        // notify_one keeps a permit if the loop is mid-tick
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.task.is_finished()
    }

    /// Cancels and waits for the loop to exit.
    pub async fn stop(self) {
        self.cancel();
        if let Err(e) = self.task.await {
            // An aborted or panicked loop has stopped ticking all the same.
            warn!(error = %e, "evaluator task ended abnormally");
        }
    }

    /// Interrupts the loop without waiting for it to observe cancellation.
    pub fn abort(&self) {
        self.running.store(false, Ordering::Release);
        self.task.abort();
    }
}
