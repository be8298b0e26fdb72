use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// 1. PHASES: The six states a carried device can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorState {
    Normal,
    FreeFall,
    Impact,
    Recovery,
    Alert,
    Emergency,
}

impl DetectorState {
    /// Label shown on a status display.
    pub fn label(&self) -> &'static str {
        match self {
            DetectorState::Normal => "Normal",
            DetectorState::FreeFall => "Free Fall",
            DetectorState::Impact => "Impact",
            DetectorState::Recovery => "Recovery",
            DetectorState::Alert => "Alert",
            DetectorState::Emergency => "Emergency",
        }
    }

    /// Alert and Emergency are never left by a tick, only by a force-set.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DetectorState::Alert | DetectorState::Emergency)
    }
}

impl fmt::Display for DetectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// 2. POSITION: Last known fix, a passenger field unrelated to the phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

// 3. OUTPUT: Consistent copy of the detector fields for presentation
//
// `min_accel` is +inf while no trough is being tracked; serde_json writes it as null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectorSnapshot {
    pub phase: DetectorState,
    pub sample: f64,
    pub min_accel: f64,
    pub max_accel: f64,
    pub impact_peak: f64,
    pub location: Location,
}

// 4. EVENTS: Published on every phase change (tick or force-set)
#[derive(Debug, Clone, Serialize)]
pub struct PhaseChange {
    pub from: DetectorState,
    pub to: DetectorState,
    pub at: DateTime<Utc>,
    pub snapshot: DetectorSnapshot,
}

// 5. ALERTS: Raised once per entry into Emergency
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyAlert {
    pub id: Uuid,
    pub raised_at: DateTime<Utc>,
    pub location: Location,
    pub impact_peak: f64,
}

impl EmergencyAlert {
    pub fn from_snapshot(snapshot: &DetectorSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            raised_at: Utc::now(),
            location: snapshot.location,
            impact_peak: snapshot.impact_peak,
        }
    }
}

// 6. INPUT: Raw 3-axis accelerometer reading (m/s²)
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SensorData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(rename = "t", default)]
    pub timestamp: Option<f64>,
}

impl SensorData {
    pub fn magnitude(&self) -> f64 {
        magnitude(self.x, self.y, self.z)
    }
}

/// Euclidean norm of a 3-axis reading.
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x.powi(2) + y.powi(2) + z.powi(2)).sqrt()
}

// 7. INPUT: Magnitude already computed by the sensor layer
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MagnitudeSample {
    pub magnitude: f64,
}

// 8. INPUT: Location fix in degrees
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
}

// 9. INPUT: Client Command (confirmation UI buttons)
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    /// "I'm okay": clears any phase back to Normal.
    Dismiss,
    /// Countdown ran out or the user asked for help.
    Escalate,
    /// Clears a resolved alert; never downgrades Emergency.
    Reset,
}

/// One decoded line of the inbound stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inbound {
    Command(ClientCommand),
    Sample(f64),
    Location(Location),
}

/// Decodes one JSON line. Commands are tried first, then sensor readings,
/// then location fixes.
pub fn parse_inbound(text: &str) -> Result<Inbound, serde_json::Error> {
    if let Ok(cmd) = serde_json::from_str::<ClientCommand>(text) {
        return Ok(Inbound::Command(cmd));
    }
    if let Ok(data) = serde_json::from_str::<SensorData>(text) {
        return Ok(Inbound::Sample(data.magnitude()));
    }
    if let Ok(sample) = serde_json::from_str::<MagnitudeSample>(text) {
        return Ok(Inbound::Sample(sample.magnitude));
    }
    let fix = serde_json::from_str::<LocationFix>(text)?;
    Ok(Inbound::Location(Location {
        latitude: fix.lat,
        longitude: fix.lon,
    }))
}
