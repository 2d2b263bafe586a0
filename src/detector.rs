// ShakeWatch - Shake Detector
//
// Turns a stream of timestamped 3-axis samples into discrete shake events.
//
//   1. Rate gate: samples closer than `update_interval_ms` to the last
//      processed one are dropped without touching state.
//   2. Speed: |current - last| / Δt(ms) * SPEED_SCALE.
//   3. speed >= threshold → the single registered listener is called
//      synchronously, on whatever thread delivered the sample.
//
// There is no debounce beyond the rate gate, so a sustained shake fires once
// per qualifying interval.

use std::time::Duration;

use crate::config::*;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::events::{Diagnostic, Sample, SensorAccuracy, ShakeEvent};
use crate::source::{SamplingRate, SensorHandle, SensorSource};

/// Upper bound on samples handled by one `pump` call, so a source that never
/// runs dry cannot starve the caller.
const PUMP_BATCH_LIMIT: usize = 64;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------
pub trait ShakeListener {
    fn on_shake_complete(&mut self, event: &ShakeEvent);
}

impl<F> ShakeListener for F
where
    F: FnMut(&ShakeEvent),
{
    fn on_shake_complete(&mut self, event: &ShakeEvent) {
        self(event)
    }
}

pub type BoxedListener = Box<dyn ShakeListener + Send>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeConfig {
    pub threshold: f64,
    pub update_interval_ms: u64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SHAKE_THRESHOLD,
            update_interval_ms: UPDATE_INTERVAL_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------
pub struct ShakeDetector {
    config: ShakeConfig,

    // Last processed reading
    last_x: f32,
    last_y: f32,
    last_z: f32,
    last_update_ms: u64,

    active: bool,
    sensor: Option<SensorHandle>,
    source: Option<Box<dyn SensorSource + Send>>,
    listener: Option<BoxedListener>,
    diagnostics: Box<dyn DiagnosticSink + Send>,
}

impl ShakeDetector {
    pub fn new(threshold: f64) -> Self {
        Self::with_config(ShakeConfig { threshold, ..ShakeConfig::default() })
    }

    /// Build from an explicit config.  A zero update interval is raised to
    /// [`MIN_UPDATE_INTERVAL_MS`]; a negative threshold is clamped to 0.
    pub fn with_config(config: ShakeConfig) -> Self {
        let mut detector = Self {
            config: ShakeConfig {
                threshold: config.threshold,
                update_interval_ms: config.update_interval_ms.max(MIN_UPDATE_INTERVAL_MS),
            },
            last_x: 0.0,
            last_y: 0.0,
            last_z: 0.0,
            last_update_ms: 0,
            active: false,
            sensor: None,
            source: None,
            listener: None,
            diagnostics: Box::new(LogSink),
        };
        detector.set_threshold(config.threshold);
        detector
    }

    /// Replace the diagnostic sink (defaults to [`LogSink`]).
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + Send + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    // ---- Lifecycle --------------------------------------------------------

    /// Subscribe to the default motion sensor of `source` at game rate.
    ///
    /// Returns `false` when the source has no accelerometer or refuses the
    /// subscription; the detector then stays inactive.  Registering while
    /// already active drops the previous subscription first but keeps the
    /// listener.
    pub fn register(&mut self, source: Box<dyn SensorSource + Send>) -> bool {
        self.release_source();
        self.sensor = None;

        let source = self.source.insert(source);
        let Some(sensor) = source.default_motion_sensor() else {
            self.diagnostics.record(Diagnostic::SensorUnavailable);
            return false;
        };

        let rate = SamplingRate::Game;
        if !source.subscribe(&sensor, rate) {
            self.diagnostics.record(Diagnostic::SubscribeRejected { sensor });
            return false;
        }

        self.diagnostics.record(Diagnostic::Registered { sensor: sensor.clone(), rate });
        self.sensor = Some(sensor);
        self.active = true;
        true
    }

    /// Unsubscribe (if subscribed), deactivate and drop the listener.
    /// Safe to call any number of times.
    pub fn unregister(&mut self) {
        if self.active {
            self.release_source();
            self.diagnostics.record(Diagnostic::Unregistered);
        }
        self.active = false;
        self.listener = None;
    }

    fn release_source(&mut self) {
        if self.active {
            if let Some(source) = self.source.as_mut() {
                source.unsubscribe();
            }
        }
        self.active = false;
    }

    // ---- Sample delivery --------------------------------------------------

    /// Process one sample.  Returns the event when the threshold was crossed,
    /// whether or not a listener was there to receive it.
    pub fn on_sample(&mut self, sample: Sample) -> Option<ShakeEvent> {
        // Earlier timestamps saturate to 0 and are gated like jitter.
        let interval = sample.timestamp.saturating_sub(self.last_update_ms);
        if interval < self.config.update_interval_ms {
            return None;
        }
        debug_assert!(interval > 0, "rate gate must keep the interval non-zero");
        self.last_update_ms = sample.timestamp;

        let [x, y, z] = sample.axes();
        let dx = x - self.last_x;
        let dy = y - self.last_y;
        let dz = z - self.last_z;

        self.last_x = x;
        self.last_y = y;
        self.last_z = z;

        let magnitude = ((dx * dx + dy * dy + dz * dz) as f64).sqrt();
        let speed = magnitude / interval as f64 * SPEED_SCALE;
        if speed < self.config.threshold {
            return None;
        }

        let event = ShakeEvent { sample, speed };
        self.diagnostics.record(Diagnostic::ShakeDetected { timestamp: sample.timestamp, speed });

        // Never call out once unregistered, even if a late sample slips in.
        if self.active {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_shake_complete(&event);
            }
        }
        Some(event)
    }

    /// Pull pending samples from the registered source and process them.
    ///
    /// Accuracy changes reported by the source are forwarded first.  Then it
    /// waits at most `timeout` for the first sample and drains whatever is
    /// already queued.  Returns how many samples were delivered.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let mut delivered = 0;
        let mut wait = timeout;

        while self.active {
            let Some(accuracy) = self.source.as_mut().and_then(|s| s.poll_accuracy()) else {
                break;
            };
            self.on_accuracy_changed(accuracy);
        }

        while self.active && delivered < PUMP_BATCH_LIMIT {
            let next = match self.source.as_mut() {
                Some(source) => source.poll_sample(wait),
                None => break,
            };
            let Some(sample) = next else { break };

            self.on_sample(sample);
            delivered += 1;
            wait = Duration::ZERO;
        }
        delivered
    }

    pub fn on_accuracy_changed(&mut self, accuracy: SensorAccuracy) {
        self.diagnostics.record(Diagnostic::AccuracyChanged { accuracy });
    }

    // ---- Threshold --------------------------------------------------------

    /// Negative (and NaN) values are clamped to 0, which makes every
    /// processed sample a shake.
    pub fn set_threshold(&mut self, threshold: f64) {
        if threshold >= 0.0 {
            self.config.threshold = threshold;
            return;
        }
        self.diagnostics.record(Diagnostic::ThresholdClamped { requested: threshold, applied: 0.0 });
        self.config.threshold = 0.0;
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    // ---- Listener (single slot) -------------------------------------------

    /// Install `listener`, returning the one it replaced.
    pub fn set_listener<L>(&mut self, listener: L) -> Option<BoxedListener>
    where
        L: ShakeListener + Send + 'static,
    {
        self.listener.replace(Box::new(listener))
    }

    pub fn listener(&self) -> Option<&(dyn ShakeListener + Send)> {
        self.listener.as_deref()
    }

    pub fn take_listener(&mut self) -> Option<BoxedListener> {
        self.listener.take()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    // ---- State ------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The sensor of the current registration; `None` after a failed one.
    pub fn sensor(&self) -> Option<&SensorHandle> {
        self.sensor.as_ref()
    }

    pub fn last_reading(&self) -> [f32; 3] {
        [self.last_x, self.last_y, self.last_z]
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    pub fn config(&self) -> ShakeConfig {
        self.config
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SHAKE_THRESHOLD)
    }
}
