// ShakeWatch - Device Drivers

pub mod accel;

#[cfg(target_os = "espidf")]
pub mod haptic;
#[cfg(target_os = "espidf")]
pub mod imu;
