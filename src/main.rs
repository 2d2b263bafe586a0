// ShakeWatch - Firmware Entry Point
//
// On the watch (target_os = "espidf"):
//   1. Bring up logging and the shared I2C bus.
//   2. Probe the MPU6050 and register the shake detector on it (game rate).
//   3. Install the haptic motor as the shake listener.
//   4. Pump samples forever; every shake buzzes the motor.
//
// On any other target the same binary replays a scripted motion trace
// (resting, a wrist shake, resting again) through the detector and prints
// each detection, so the pipeline can be exercised on a workstation.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    replay::run()
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use shakewatch::config::*;
    use shakewatch::drivers::haptic::HapticDriver;
    use shakewatch::drivers::imu::Mpu6050;
    use shakewatch::{ShakeDetector, ThreadedSource};

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("ShakeWatch firmware starting…");

        let peripherals = Peripherals::take()?;

        // ---- I2C bus ------------------------------------------------------
        let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio6, // SDA
            peripherals.pins.gpio7, // SCL
            &i2c_config,
        )?;
        log::info!("I2C up on SDA=GPIO{} SCL=GPIO{}", PIN_I2C_SDA, PIN_I2C_SCL);
        // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
        // It will live for the entire programme duration (embedded firmware never exits).
        let i2c_bus: &'static Mutex<I2cDriver<'static>> =
            Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

        // ---- Haptic listener ----------------------------------------------
        let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
        // SAFETY: GPIO peripheral lives forever, same argument as I2C above.
        let haptic_static: PinDriver<'static, AnyOutputPin, Output> =
            unsafe { core::mem::transmute(haptic_pin) };
        log::info!("Haptic motor on GPIO{}", PIN_HAPTIC);

        // ---- Detector -----------------------------------------------------
        let mut detector = ShakeDetector::new(FIRMWARE_SHAKE_THRESHOLD);
        detector.set_listener(HapticDriver::new(haptic_static));

        let source = ThreadedSource::new(Mpu6050::new(i2c_bus));
        if !detector.register(Box::new(source)) {
            log::error!("Shake detection unavailable - no accelerometer");
            // Park so the serial log stays readable.
            loop {
                thread::sleep(Duration::from_secs(60));
            }
        }
        log::info!("Shake detection armed (threshold {})", detector.threshold());

        let pump_timeout = Duration::from_millis(PUMP_TIMEOUT_MS);
        loop {
            detector.pump(pump_timeout);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod replay {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use shakewatch::config::*;
    use shakewatch::{ReplaySource, Sample, ShakeDetector, ShakeEvent};

    const STEP_MS: u64 = 20;
    const GRAVITY: f32 = STANDARD_GRAVITY;

    /// Two seconds at rest, one second of ±2.5 g side-to-side shaking at 4 Hz,
    /// two seconds at rest.  Game-rate spacing, so the rate gate has work.
    fn scripted_trace() -> Vec<Sample> {
        let mut samples = Vec::new();
        let mut t = 0;
        for _ in 0..100 {
            t += STEP_MS;
            samples.push(Sample::new(0.05, -0.02, GRAVITY, t));
        }
        for i in 0..50u64 {
            t += STEP_MS;
            let phase = (i * STEP_MS) as f32 / 250.0 * std::f32::consts::TAU;
            samples.push(Sample::new(2.5 * GRAVITY * phase.sin(), 0.3, GRAVITY, t));
        }
        for _ in 0..100 {
            t += STEP_MS;
            samples.push(Sample::new(0.04, -0.01, GRAVITY, t));
        }
        samples
    }

    pub fn run() -> anyhow::Result<()> {
        println!("ShakeWatch replay - threshold {}", FIRMWARE_SHAKE_THRESHOLD);

        let mut source = ReplaySource::new();
        source.extend(scripted_trace());
        let total = source.pending();
        let probe = source.probe();

        let shakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&shakes);

        let mut detector = ShakeDetector::new(FIRMWARE_SHAKE_THRESHOLD);
        detector.set_listener(move |event: &ShakeEvent| {
            counter.fetch_add(1, Ordering::Relaxed);
            println!(
                "  shake at t={:>5} ms  speed {:>7.1}  ({:+.2}, {:+.2}, {:+.2})",
                event.sample.timestamp, event.speed, event.sample.x, event.sample.y, event.sample.z
            );
        });

        if !detector.register(Box::new(source)) {
            anyhow::bail!("replay source offered no accelerometer");
        }

        while probe.delivered() < total {
            if detector.pump(Duration::ZERO) == 0 {
                break;
            }
        }
        detector.unregister();

        println!(
            "Replayed {} samples, {} shake event(s)",
            probe.delivered(),
            shakes.load(Ordering::Relaxed)
        );
        Ok(())
    }
}
