//! Runtime configuration, read from the environment (and `.env` if present).

use crate::error::ConfigError;
use crate::evaluator::TICK_INTERVAL;
use std::time::Duration;
use tracing::Level;

pub const TICK_MS_VAR: &str = "FALLWATCH_TICK_MS";
pub const CONFIRM_SECS_VAR: &str = "FALLWATCH_CONFIRM_SECS";
pub const EVENT_CAPACITY_VAR: &str = "FALLWATCH_EVENT_CAPACITY";
pub const LOG_LEVEL_VAR: &str = "FALLWATCH_LOG_LEVEL";

const MAX_TICK_MS: u64 = 60_000;
const MAX_CONFIRM_SECS: u64 = 3600;
const MAX_EVENT_CAPACITY: u64 = 65_536;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Evaluator cadence.
    pub tick_interval: Duration,
    /// How long an Alert waits for a dismissal before escalating.
    pub confirm_window: Duration,
    /// Phase-change broadcast capacity (drop oldest when overwhelmed).
    pub event_capacity: usize,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            confirm_window: Duration::from_secs(5),
            event_capacity: 100,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tick_interval = match lookup(TICK_MS_VAR) {
            Some(raw) => Duration::from_millis(parse_bounded(TICK_MS_VAR, &raw, MAX_TICK_MS)?),
            None => defaults.tick_interval,
        };
        let confirm_window = match lookup(CONFIRM_SECS_VAR) {
            Some(raw) => Duration::from_secs(parse_bounded(CONFIRM_SECS_VAR, &raw, MAX_CONFIRM_SECS)?),
            None => defaults.confirm_window,
        };
        let event_capacity = match lookup(EVENT_CAPACITY_VAR) {
            Some(raw) => parse_bounded(EVENT_CAPACITY_VAR, &raw, MAX_EVENT_CAPACITY)? as usize,
            None => defaults.event_capacity,
        };
        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<Level>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: LOG_LEVEL_VAR,
                    value: raw.clone(),
                    reason: "expected one of trace, debug, info, warn, error",
                })?,
            None => defaults.log_level,
        };

        Ok(Self {
            tick_interval,
            confirm_window,
            event_capacity,
            log_level,
        })
    }
}

/// Parses a whole number in `1..=max`.
fn parse_bounded(key: &'static str, raw: &str, max: u64) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(n) if n > max => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "exceeds the allowed maximum",
        }),
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a whole number",
        }),
    }
}
