use crate::model::{DetectorSnapshot, DetectorState, Location};
use std::time::{Duration, Instant};

pub const FREE_FALL_THRESHOLD: f64 = 0.8; // m/s²
pub const IMPACT_THRESHOLD: f64 = 12.0; // m/s²
pub const RECOVERY_THRESHOLD: f64 = 8.0; // m/s²
pub const IMPACT_WINDOW: Duration = Duration::from_millis(2000);
pub const RECOVERY_WINDOW: Duration = Duration::from_millis(10000);

/// Resting value of `min_accel`: any real reading lowers it.
pub const TROUGH_SENTINEL: f64 = f64::INFINITY;
/// Resting value of `max_accel` and `impact_peak`. Magnitudes are never
/// negative, so the first free-fall reading always raises it.
pub const PEAK_SENTINEL: f64 = 0.0;

/// A phase change performed by [`FallDetector::tick`] or [`FallDetector::force_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DetectorState,
    pub to: DetectorState,
}

/// Polling state machine. Holds no lock of its own; see `crate::detector`
/// for the shared handle.
#[derive(Debug, Clone)]
pub struct FallDetector {
    phase: DetectorState,
    sample: f64,
    min_accel: f64,
    max_accel: f64,
    impact_peak: f64,
    phase_entered_at: Instant,
    location: Location,
}

impl FallDetector {
    pub fn new(now: Instant) -> Self {
        Self {
            phase: DetectorState::Normal,
            sample: 0.0,
            min_accel: TROUGH_SENTINEL,
            max_accel: PEAK_SENTINEL,
            impact_peak: PEAK_SENTINEL,
            phase_entered_at: now,
            location: Location::default(),
        }
    }

    pub fn phase(&self) -> DetectorState {
        self.phase
    }

    pub fn phase_entered_at(&self) -> Instant {
        self.phase_entered_at
    }

    pub fn push_sample(&mut self, value: f64) {
        self.sample = value;
    }

    pub fn push_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        DetectorSnapshot {
            phase: self.phase,
            sample: self.sample,
            min_accel: self.min_accel,
            max_accel: self.max_accel,
            impact_peak: self.impact_peak,
            location: self.location,
        }
    }

    /// Unconditional override. Forcing `Normal` also clears the extremal
    /// fields, even out of `Emergency`.
    pub fn force_state(&mut self, phase: DetectorState, now: Instant) -> Option<Transition> {
        let from = self.phase;
        self.phase = phase;
        self.phase_entered_at = now;
        if phase == DetectorState::Normal {
            self.clear_extremes();
        }
        (from != phase).then_some(Transition { from, to: phase })
    }

    /// Clears the extremal fields and returns to `Normal`, unless the
    /// detector is in `Emergency`, which only a force-set can leave.
    pub fn reset(&mut self) -> Option<Transition> {
        self.clear_extremes();
        match self.phase {
            DetectorState::Emergency | DetectorState::Normal => None,
            from => {
                self.phase = DetectorState::Normal;
                Some(Transition {
                    from,
                    to: DetectorState::Normal,
                })
            }
        }
    }

    /// One evaluation step against the latest pushed sample.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        let from = self.phase;
        let accel = self.sample;

        match self.phase {
            DetectorState::Normal => {
                if accel < FREE_FALL_THRESHOLD {
                    if accel < self.min_accel {
                        // Still descending into the trough
                        self.min_accel = accel;
                    } else {
                        self.enter(DetectorState::FreeFall, now);
                        self.max_accel = PEAK_SENTINEL;
                    }
                } else {
                    self.min_accel = TROUGH_SENTINEL;
                }
            }
            DetectorState::FreeFall => {
                if self.elapsed(now) > IMPACT_WINDOW {
                    self.phase = DetectorState::Normal;
                    self.min_accel = TROUGH_SENTINEL;
                } else if accel > self.max_accel {
                    self.max_accel = accel;
                    if self.max_accel > IMPACT_THRESHOLD {
                        self.impact_peak = self.max_accel;
                        self.enter(DetectorState::Impact, now);
                    }
                }
            }
            DetectorState::Impact => match resolve_impact(self.impact_peak, self.min_accel) {
                DetectorState::Recovery => self.enter(DetectorState::Recovery, now),
                other => self.phase = other,
            },
            DetectorState::Recovery => {
                if self.elapsed(now) > RECOVERY_WINDOW {
                    self.phase = DetectorState::Alert;
                } else if accel > RECOVERY_THRESHOLD {
                    self.phase = DetectorState::Normal;
                }
            }
            DetectorState::Alert | DetectorState::Emergency => {}
        }

        (from != self.phase).then_some(Transition {
            from,
            to: self.phase,
        })
    }

    fn enter(&mut self, phase: DetectorState, now: Instant) {
        self.phase = phase;
        self.phase_entered_at = now;
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.phase_entered_at)
    }

    fn clear_extremes(&mut self) {
        self.min_accel = TROUGH_SENTINEL;
        self.max_accel = PEAK_SENTINEL;
        self.impact_peak = PEAK_SENTINEL;
    }
}

/// Where `Impact` leads: a trough-to-peak swing wider than the gap between
/// the free-fall and impact thresholds confirms the fall.
pub fn resolve_impact(impact_peak: f64, min_accel: f64) -> DetectorState {
    if impact_peak - min_accel > IMPACT_THRESHOLD - FREE_FALL_THRESHOLD {
        DetectorState::Recovery
    } else {
        DetectorState::Normal
    }
}
