//! Fall detection engine.
//!
//! A [`Detector`] classifies the latest acceleration magnitude into one of
//! six phases. An [`Evaluator`] ticks it at a fixed cadence and an
//! [`AlertWorkflow`] turns unconfirmed alerts into emergencies.

pub mod alert;
pub mod config;
pub mod detector;
pub mod error;
pub mod evaluator;
pub mod logic;
pub mod model;
pub mod telemetry;


pub use alert::{apply_command, AlertWorkflow};
pub use config::Config;
pub use detector::Detector;
pub use error::{ConfigError, MonitorError};
pub use evaluator::{Evaluator, EvaluatorHandle};
pub use model::{DetectorSnapshot, DetectorState, EmergencyAlert, Location, PhaseChange};
