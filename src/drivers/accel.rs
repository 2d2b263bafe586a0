// ShakeWatch - Accelerometer Abstraction
//
// The threaded sensor source only needs three things from a chip: a presence
// probe, one-time init, and a 3-axis reading in m/s².  The MPU6050 driver
// implements this on the watch; tests implement it in memory.

pub trait Accelerometer {
    /// Human-readable part name, used as the sensor handle name.
    fn name(&self) -> &str;

    /// Full-scale range in m/s².
    fn max_range(&self) -> f32;

    /// Verify the device answers on its bus.
    fn is_connected(&self) -> bool;

    fn init(&self) -> anyhow::Result<()>;

    /// One reading, `[x, y, z]` in m/s².
    fn read_accel(&self) -> anyhow::Result<[f32; 3]>;
}
