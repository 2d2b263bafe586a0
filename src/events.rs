// ShakeWatch - Samples, Shake Events & Diagnostics

use std::fmt;

use crate::source::{SamplingRate, SensorHandle};

// ---------------------------------------------------------------------------
// Sample (3-axis accelerometer reading, m/s²)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Milliseconds on the source's clock.
    pub timestamp: u64,
}

impl Sample {
    pub fn new(x: f32, y: f32, z: f32, timestamp: u64) -> Self {
        Self { x, y, z, timestamp }
    }

    pub fn axes(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

// ---------------------------------------------------------------------------
// Shake Event - handed to the listener, one per detection
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeEvent {
    /// The sample whose delta crossed the threshold.
    pub sample: Sample,
    /// Derived speed that was compared against the threshold.
    pub speed: f64,
}

// ---------------------------------------------------------------------------
// Sensor Accuracy (reported by sources, logged only)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

impl SensorAccuracy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unreliable => "unreliable",
            Self::Low        => "low",
            Self::Medium     => "medium",
            Self::High       => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics - structured output of the detector, routed to a sink
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A negative (or NaN) threshold was replaced.
    ThresholdClamped { requested: f64, applied: f64 },
    /// The source has no accelerometer-class sensor.
    SensorUnavailable,
    /// The source found a sensor but refused the subscription.
    SubscribeRejected { sensor: SensorHandle },
    Registered { sensor: SensorHandle, rate: SamplingRate },
    Unregistered,
    AccuracyChanged { accuracy: SensorAccuracy },
    ShakeDetected { timestamp: u64, speed: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThresholdClamped { requested, applied } => write!(
                f,
                "shake threshold must not be negative ({}), reset to {}",
                requested, applied
            ),
            Self::SensorUnavailable => write!(f, "no accelerometer available - sensor init failed"),
            Self::SubscribeRejected { sensor } => {
                write!(f, "sensor '{}' rejected the subscription", sensor.name)
            }
            Self::Registered { sensor, rate } => write!(
                f,
                "registered on '{}' at {:?} rate ({} ms)",
                sensor.name,
                rate,
                rate.interval().as_millis()
            ),
            Self::Unregistered => write!(f, "unregistered from sensor source"),
            Self::AccuracyChanged { accuracy } => {
                write!(f, "accuracy changed, accuracy = {}", accuracy.label())
            }
            Self::ShakeDetected { timestamp, speed } => {
                write!(f, "shake at t={} ms (speed {:.1})", timestamp, speed)
            }
        }
    }
}
