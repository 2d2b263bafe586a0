// ShakeWatch - Sensor Task
//
// `ThreadedSource` is the device-backed `SensorSource`.  Subscribing spawns a
// dedicated thread that reads the accelerometer at the requested cadence and
// pushes timestamped samples into a bounded channel; the detector drains that
// channel from its own thread via `pump`.  Unsubscribing raises a stop flag and joins
// the thread, so no reader outlives its subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::accel::Accelerometer;
use crate::events::Sample;
use crate::source::{SamplingRate, SensorHandle, SensorKind, SensorSource};

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    rx: Receiver<Sample>,
}

pub struct ThreadedSource<A> {
    accel: Arc<A>,
    epoch: Instant,
    stack_size: usize,
    worker: Option<Worker>,
}

impl<A> ThreadedSource<A>
where
    A: Accelerometer + Send + Sync + 'static,
{
    /// Sample timestamps count milliseconds from this call.
    pub fn new(accel: A) -> Self {
        Self {
            accel: Arc::new(accel),
            epoch: Instant::now(),
            stack_size: STACK_SENSOR,
            worker: None,
        }
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn accelerometer(&self) -> &A {
        &self.accel
    }
}

impl<A> ThreadedSource<A> {
    fn stop_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::SeqCst);
        drop(worker.rx);
        if worker.handle.join().is_err() {
            log::error!("Sensor thread panicked");
        }
    }
}

impl<A> SensorSource for ThreadedSource<A>
where
    A: Accelerometer + Send + Sync + 'static,
{
    fn default_motion_sensor(&mut self) -> Option<SensorHandle> {
        if !self.accel.is_connected() {
            log::warn!("{} not responding", self.accel.name());
            return None;
        }
        Some(SensorHandle::new(
            self.accel.name(),
            SensorKind::Accelerometer,
            self.accel.max_range(),
        ))
    }

    fn subscribe(&mut self, sensor: &SensorHandle, rate: SamplingRate) -> bool {
        self.stop_worker();

        if let Err(e) = self.accel.init() {
            log::error!("{} init failed: {}", sensor.name, e);
            return false;
        }

        let (tx, rx) = mpsc::sync_channel(SENSOR_QUEUE_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));
        let accel = Arc::clone(&self.accel);
        let thread_stop = Arc::clone(&stop);
        let epoch = self.epoch;
        let interval = rate.interval();

        let spawned = thread::Builder::new()
            .name("sensor".into())
            .stack_size(self.stack_size)
            .spawn(move || sensor_task(&*accel, epoch, interval, &thread_stop, tx));

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { stop, handle, rx });
                true
            }
            Err(e) => {
                log::error!("Failed to spawn sensor thread: {}", e);
                false
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.stop_worker();
    }

    fn is_subscribed(&self) -> bool {
        self.worker.is_some()
    }

    fn poll_sample(&mut self, timeout: Duration) -> Option<Sample> {
        self.worker.as_ref()?.rx.recv_timeout(timeout).ok()
    }
}

impl<A> Drop for ThreadedSource<A> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn sensor_task<A: Accelerometer>(
    accel: &A,
    epoch: Instant,
    interval: Duration,
    stop: &AtomicBool,
    sensor_tx: SyncSender<Sample>,
) {
    log::info!("Sensor task started ({} every {} ms)", accel.name(), interval.as_millis());

    while !stop.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        match accel.read_accel() {
            Ok([x, y, z]) => {
                let timestamp = epoch.elapsed().as_millis() as u64;
                // Never block the sensor: if the detector is behind, the
                // newest reading is dropped.
                match sensor_tx.try_send(Sample::new(x, y, z, timestamp)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        log::debug!("Sensor queue full - dropping sample at t={} ms", timestamp);
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        // Receiver dropped - subscription is gone.
                        log::warn!("Sensor channel closed - exiting sensor task");
                        return;
                    }
                }
            }
            Err(e) => {
                log::warn!("Accelerometer read error: {}", e);
            }
        }

        // Sleep for the remainder of the sampling interval.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }

    log::info!("Sensor task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const WAIT: Duration = Duration::from_secs(2);
    const TEST_STACK: usize = 64 * 1024;

    #[derive(Default)]
    struct FakeAccel {
        missing: bool,
        broken_init: bool,
        flaky: bool,
        reads: AtomicUsize,
    }

    impl Accelerometer for FakeAccel {
        fn name(&self) -> &str {
            "fake-accel"
        }

        fn max_range(&self) -> f32 {
            ACCEL_RANGE_8G
        }

        fn is_connected(&self) -> bool {
            !self.missing
        }

        fn init(&self) -> anyhow::Result<()> {
            if self.broken_init {
                anyhow::bail!("no ack from device");
            }
            Ok(())
        }

        fn read_accel(&self) -> anyhow::Result<[f32; 3]> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            if self.flaky && n % 2 == 0 {
                anyhow::bail!("bus timeout");
            }
            Ok([n as f32, 0.0, STANDARD_GRAVITY])
        }
    }

    fn source(accel: FakeAccel) -> ThreadedSource<FakeAccel> {
        ThreadedSource::new(accel).with_stack_size(TEST_STACK)
    }

    #[test]
    fn disconnected_chip_has_no_sensor() {
        let mut src = source(FakeAccel { missing: true, ..Default::default() });
        assert!(src.default_motion_sensor().is_none());
    }

    #[test]
    fn handle_describes_chip() {
        let mut src = source(FakeAccel::default());
        let sensor = src.default_motion_sensor().unwrap();
        assert_eq!(sensor.name, "fake-accel");
        assert_eq!(sensor.kind, SensorKind::Accelerometer);
    }

    #[test]
    fn failed_init_refuses_subscription() {
        let mut src = source(FakeAccel { broken_init: true, ..Default::default() });
        let sensor = src.default_motion_sensor().unwrap();
        assert!(!src.subscribe(&sensor, SamplingRate::Game));
        assert!(!src.is_subscribed());
        assert_eq!(src.accelerometer().reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delivers_ordered_samples_until_unsubscribed() {
        let mut src = source(FakeAccel::default());
        let sensor = src.default_motion_sensor().unwrap();
        assert!(src.subscribe(&sensor, SamplingRate::Fastest));

        let first = src.poll_sample(WAIT).unwrap();
        let second = src.poll_sample(WAIT).unwrap();
        assert!(second.timestamp >= first.timestamp);
        assert!(second.x > first.x);
        assert_eq!(first.z, STANDARD_GRAVITY);

        src.unsubscribe();
        assert!(!src.is_subscribed());
        assert!(src.poll_sample(Duration::ZERO).is_none());

        let reads = src.accelerometer().reads.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(src.accelerometer().reads.load(Ordering::SeqCst), reads);
    }

    #[test]
    fn read_errors_are_skipped() {
        let mut src = source(FakeAccel { flaky: true, ..Default::default() });
        let sensor = src.default_motion_sensor().unwrap();
        assert!(src.subscribe(&sensor, SamplingRate::Fastest));

        // Even-numbered reads fail; only odd ones come through.
        for _ in 0..3 {
            let sample = src.poll_sample(WAIT).unwrap();
            assert_eq!(sample.x as usize % 2, 1);
        }
    }

    #[test]
    fn undrained_queue_stays_bounded() {
        let mut src = source(FakeAccel::default());
        let sensor = src.default_motion_sensor().unwrap();
        assert!(src.subscribe(&sensor, SamplingRate::Game));

        // ~50 reads at game rate while nobody drains.
        thread::sleep(Duration::from_secs(1));
        assert!(src.accelerometer().reads.load(Ordering::SeqCst) > SENSOR_QUEUE_DEPTH + 5);

        let mut drained = 0;
        while src.poll_sample(Duration::ZERO).is_some() {
            drained += 1;
        }
        assert!(drained <= SENSOR_QUEUE_DEPTH + 1, "drained {}", drained);
    }

    #[test]
    fn resubscribe_replaces_worker() {
        let mut src = source(FakeAccel::default());
        let sensor = src.default_motion_sensor().unwrap();
        assert!(src.subscribe(&sensor, SamplingRate::Fastest));
        assert!(src.subscribe(&sensor, SamplingRate::Game));
        assert!(src.poll_sample(WAIT).is_some());
    }

    #[test]
    fn unsubscribe_without_subscription_is_noop() {
        let mut src = source(FakeAccel::default());
        src.unsubscribe();
        assert!(!src.is_subscribed());
    }
}
