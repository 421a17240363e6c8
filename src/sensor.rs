//! Sensor module - Vibration samples, signal sources, scoring and the sliding window

pub mod anomaly;
pub mod generator;
pub mod window;

use std::fmt;

use chrono::Local;
use serde::Serialize;

// ============================================================================
// TIMESTAMP - Carried through scoring unchanged
// ============================================================================

pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn now() -> Self {
        Self(Local::now().format(WALL_CLOCK_FORMAT).to_string())
    }

    pub fn logical(tick: u64) -> Self {
        Self(tick.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SAMPLE - One three-axis reading
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(timestamp: Timestamp, x: f64, y: f64, z: f64) -> Self {
        Self { timestamp, x, y, z }
    }

    pub fn values(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

// ============================================================================
// LABELED SAMPLE - Scorer output
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub sample: Sample,
    pub error: f64,
    pub is_anomaly: bool,
}
