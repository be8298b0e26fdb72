//! Shared detector handle.
//!
//! All fields live behind one mutex so a tick can never interleave with a
//! producer write. Phase changes are broadcast before the lock is released,
//! so every subscriber sees them in the order they happened.

use crate::logic::{FallDetector, Transition};
use crate::model::{DetectorSnapshot, DetectorState, Location, PhaseChange};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::debug;

struct Inner {
    state: Mutex<FallDetector>,
    events: broadcast::Sender<PhaseChange>,
}

/// Cheap to clone; every clone refers to the same detector.
#[derive(Clone)]
pub struct Detector {
    inner: Arc<Inner>,
}

impl Detector {
    /// `capacity` bounds how many unread phase changes a slow subscriber may
    /// fall behind before it starts losing the oldest ones. A capacity of
    /// zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (events, _rx) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(FallDetector::new(now())),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhaseChange> {
        self.inner.events.subscribe()
    }

    /// Latest reading wins; nothing is evaluated until the next tick.
    pub fn push_sample(&self, value: f64) {
        self.inner.state.lock().push_sample(value);
    }

    pub fn push_location(&self, latitude: f64, longitude: f64) {
        self.inner.state.lock().push_location(Location {
            latitude,
            longitude,
        });
    }

    pub fn force_state(&self, phase: DetectorState) {
        let mut state = self.inner.state.lock();
        if let Some(transition) = state.force_state(phase, now()) {
            self.publish(transition, &state);
        }
    }

    /// Force-sets `to` only if the detector is still in `expected`, checked
    /// and applied under one lock. Returns whether the change was made.
    pub fn escalate_if(&self, expected: DetectorState, to: DetectorState) -> bool {
        let mut state = self.inner.state.lock();
        if state.phase() != expected {
            return false;
        }
        if let Some(transition) = state.force_state(to, now()) {
            self.publish(transition, &state);
        }
        true
    }

    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        if let Some(transition) = state.reset() {
            self.publish(transition, &state);
        }
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn phase(&self) -> DetectorState {
        self.inner.state.lock().phase()
    }

    /// Runs one evaluation step. Normally driven by the evaluator loop.
    pub fn tick(&self, now: Instant) -> Option<Transition> {
        let mut state = self.inner.state.lock();
        let transition = state.tick(now)?;
        self.publish(transition, &state);
        Some(transition)
    }

    /// Sends while the caller still holds the lock, so subscribers see
    /// changes in the order they were applied. `send` never blocks.
    fn publish(&self, transition: Transition, state: &FallDetector) {
        let snapshot = state.snapshot();
        debug!(
            from = %transition.from,
            to = %transition.to,
            sample = snapshot.sample,
            min_accel = snapshot.min_accel,
            impact_peak = snapshot.impact_peak,
            "phase change"
        );
        // No subscribers is fine: the change is still visible through snapshot().
        let _ = self.inner.events.send(PhaseChange {
            from: transition.from,
            to: transition.to,
            at: Utc::now(),
            snapshot,
        });
    }
}

/// Monotonic time on tokio's clock, so force-set timestamps and evaluator
/// ticks agree even when that clock is paused.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(100)
    }
}
