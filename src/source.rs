// ShakeWatch - Sensor Source Capability
//
// The detector never talks to hardware directly.  It asks a `SensorSource`
// for its default motion sensor, subscribes at a sampling rate, and pulls
// timestamped samples from it.  `ReplaySource` is the scripted in-memory
// source used by the host binary and the tests; `tasks::sensor` provides the
// threaded source backed by a real accelerometer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::*;
use crate::events::{Sample, SensorAccuracy};

// ---------------------------------------------------------------------------
// Sensor description
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Accelerometer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorHandle {
    pub name: String,
    pub kind: SensorKind,
    /// Full-scale range in m/s².
    pub max_range: f32,
}

impl SensorHandle {
    pub fn new(name: impl Into<String>, kind: SensorKind, max_range: f32) -> Self {
        Self { name: name.into(), kind, max_range }
    }
}

/// Polling cadence hint passed on subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingRate {
    Fastest,
    Game,
    Ui,
    Normal,
}

impl SamplingRate {
    pub fn interval(&self) -> Duration {
        let ms = match self {
            Self::Fastest => RATE_FASTEST_MS,
            Self::Game    => RATE_GAME_MS,
            Self::Ui      => RATE_UI_MS,
            Self::Normal  => RATE_NORMAL_MS,
        };
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------
pub trait SensorSource {
    /// The default 3-axis accelerometer-class sensor, if the source has one.
    fn default_motion_sensor(&mut self) -> Option<SensorHandle>;

    /// Start delivering samples from `sensor`.  Returns `false` when refused.
    fn subscribe(&mut self, sensor: &SensorHandle, rate: SamplingRate) -> bool;

    /// Stop delivering samples.  Must be safe to call when not subscribed.
    fn unsubscribe(&mut self);

    fn is_subscribed(&self) -> bool;

    /// Next pending sample, waiting at most `timeout`.
    fn poll_sample(&mut self, timeout: Duration) -> Option<Sample>;

    /// Next pending accuracy change, if the source reports any.  Never waits.
    fn poll_accuracy(&mut self) -> Option<SensorAccuracy> {
        None
    }
}

// ---------------------------------------------------------------------------
// ReplaySource - scripted samples, no hardware
// ---------------------------------------------------------------------------

/// Counters shared with whoever built the source, so subscription traffic can
/// be inspected after the source has been handed to a detector.
#[derive(Debug, Default)]
pub struct ReplayProbe {
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    delivered: AtomicUsize,
    last_rate: Mutex<Option<SamplingRate>>,
}

impl ReplayProbe {
    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::Relaxed)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn last_rate(&self) -> Option<SamplingRate> {
        *self.last_rate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct ReplaySource {
    sensor: Option<SensorHandle>,
    accept: bool,
    subscribed: bool,
    queue: VecDeque<Sample>,
    accuracy: VecDeque<SensorAccuracy>,
    probe: Arc<ReplayProbe>,
}

impl ReplaySource {
    /// A source exposing one virtual ±8 g accelerometer.
    pub fn new() -> Self {
        Self::with_sensor(Some(SensorHandle::new(
            "replay-accelerometer",
            SensorKind::Accelerometer,
            ACCEL_RANGE_8G,
        )))
    }

    /// A source with no motion sensor at all.
    pub fn without_sensor() -> Self {
        Self::with_sensor(None)
    }

    pub fn with_sensor(sensor: Option<SensorHandle>) -> Self {
        Self {
            sensor,
            accept: true,
            subscribed: false,
            queue: VecDeque::new(),
            accuracy: VecDeque::new(),
            probe: Arc::new(ReplayProbe::default()),
        }
    }

    /// Make `subscribe` refuse even though a sensor exists.
    pub fn rejecting(mut self) -> Self {
        self.accept = false;
        self
    }

    pub fn push(&mut self, sample: Sample) {
        self.queue.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.queue.extend(samples);
    }

    /// Queue an accuracy change, reported ahead of any queued samples.
    pub fn push_accuracy(&mut self, accuracy: SensorAccuracy) {
        self.accuracy.push_back(accuracy);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn probe(&self) -> Arc<ReplayProbe> {
        Arc::clone(&self.probe)
    }
}

impl Default for ReplaySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for ReplaySource {
    fn default_motion_sensor(&mut self) -> Option<SensorHandle> {
        self.sensor.clone()
    }

    fn subscribe(&mut self, sensor: &SensorHandle, rate: SamplingRate) -> bool {
        if !self.accept || self.sensor.as_ref() != Some(sensor) {
            return false;
        }
        self.probe.subscribes.fetch_add(1, Ordering::Relaxed);
        *self.probe.last_rate.lock().unwrap_or_else(|e| e.into_inner()) = Some(rate);
        self.subscribed = true;
        true
    }

    fn unsubscribe(&mut self) {
        if self.subscribed {
            self.probe.unsubscribes.fetch_add(1, Ordering::Relaxed);
        }
        self.subscribed = false;
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    // Scripted samples are always "ready"; the timeout is never waited out.
    fn poll_sample(&mut self, _timeout: Duration) -> Option<Sample> {
        if !self.subscribed {
            return None;
        }
        let sample = self.queue.pop_front()?;
        self.probe.delivered.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }

    fn poll_accuracy(&mut self) -> Option<SensorAccuracy> {
        if !self.subscribed {
            return None;
        }
        self.accuracy.pop_front()
    }
}
