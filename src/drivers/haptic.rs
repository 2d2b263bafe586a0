// ShakeWatch - Haptic Motor Driver
//
// Simple GPIO-driven vibration motor.  The firmware's shake listener.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::config::HAPTIC_PULSE_MS;
use crate::detector::ShakeListener;
use crate::events::ShakeEvent;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }
}

impl ShakeListener for HapticDriver<'static> {
    fn on_shake_complete(&mut self, event: &ShakeEvent) {
        log::info!("Shake! speed {:.0} at t={} ms", event.speed, event.sample.timestamp);
        self.buzz(Duration::from_millis(HAPTIC_PULSE_MS));
    }
}
