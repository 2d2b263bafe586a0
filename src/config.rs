// ShakeWatch - Detector & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V), host builds for replay/tests

// ---------------------------------------------------------------------------
// Shake Detection
// ---------------------------------------------------------------------------
pub const DEFAULT_SHAKE_THRESHOLD: f64 = 2000.0;  // Speed units, see SPEED_SCALE
pub const FIRMWARE_SHAKE_THRESHOLD: f64 = 2200.0; // Slightly stiffer on the wrist
pub const UPDATE_INTERVAL_MS: u64 = 100;          // Rate gate between processed samples
pub const MIN_UPDATE_INTERVAL_MS: u64 = 1;        // Floor so the speed division is defined
pub const SPEED_SCALE: f64 = 10_000.0;            // |Δa| / Δt(ms) * SPEED_SCALE

// ---------------------------------------------------------------------------
// Sampling cadences (milliseconds between readings)
// ---------------------------------------------------------------------------
pub const RATE_FASTEST_MS: u64 = 0;
pub const RATE_GAME_MS: u64 = 20;                 // 50 Hz - what the detector asks for
pub const RATE_UI_MS: u64 = 66;                   // ~15 Hz
pub const RATE_NORMAL_MS: u64 = 200;              // 5 Hz

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;             // bytes
pub const SENSOR_QUEUE_DEPTH: usize = 16;         // Samples buffered ahead of the detector
pub const PUMP_TIMEOUT_MS: u64 = 250;             // Detector wait per pump() call
pub const HAPTIC_PULSE_MS: u64 = 120;             // Vibration on shake

// ---------------------------------------------------------------------------
// I2C Bus / MPU6050
// ---------------------------------------------------------------------------
pub const PIN_HAPTIC: i32 = 4;                    // D2/A2 - Haptic motor control
pub const PIN_I2C_SDA: i32 = 6;                   // D4    - I2C data line
pub const PIN_I2C_SCL: i32 = 7;                   // D5    - I2C clock line
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_TIMEOUT_TICKS: u32 = 1000;          // FreeRTOS ticks
pub const ACCEL_SCALE_8G: f32 = 4096.0;           // LSB/g  at ±8 g
pub const STANDARD_GRAVITY: f32 = 9.806_65;       // m/s² per g
pub const ACCEL_RANGE_8G: f32 = 8.0 * STANDARD_GRAVITY;
