//! ShakeWatch - shake-to-trigger gesture detection.
//!
//! A [`ShakeDetector`] consumes timestamped 3-axis accelerometer samples from
//! a [`SensorSource`], estimates how fast the reading is changing, and calls a
//! single [`ShakeListener`] whenever that estimate reaches the threshold.
//!
//! Samples closer together than 100 ms are dropped by a rate gate; the speed
//! of the rest is `|current - last| / Δt(ms) * 10000`, compared against a
//! default threshold of 2000.
//!
//! ```
//! use shakewatch::{ReplaySource, Sample, ShakeDetector};
//!
//! let mut source = ReplaySource::new();
//! source.push(Sample::new(0.0, 0.0, 9.8, 100));
//! source.push(Sample::new(25.0, -3.0, 9.8, 200));
//!
//! let mut detector = ShakeDetector::default();
//! detector.set_listener(|event: &shakewatch::ShakeEvent| {
//!     println!("shake at {} ms", event.sample.timestamp);
//! });
//! assert!(detector.register(Box::new(source)));
//! detector.pump(std::time::Duration::ZERO);
//! detector.unregister();
//! ```

pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod drivers;
pub mod events;
pub mod source;
pub mod tasks;

pub use detector::{BoxedListener, ShakeConfig, ShakeDetector, ShakeListener};
pub use diagnostics::{DiagnosticSink, LogSink, MemorySink};
pub use drivers::accel::Accelerometer;
pub use events::{Diagnostic, Sample, SensorAccuracy, ShakeEvent};
pub use source::{ReplayProbe, ReplaySource, SamplingRate, SensorHandle, SensorKind, SensorSource};
pub use tasks::sensor::ThreadedSource;
