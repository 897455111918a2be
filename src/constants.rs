//! Sensor geometry and timing constants
//!
//! These values describe the 12-bit rotary position sensor and the validity
//! window applied to each update cycle.

/// Counts in one full mechanical revolution (12-bit resolution).
pub const COUNTS_PER_REVOLUTION: u16 = 4096;

/// Mask applied to the 16-bit register word to keep the 12 angle bits.
pub const RAW_ANGLE_MASK: u16 = 0x0FFF;

/// Register holding the high byte of the raw angle; the low byte follows at 0x0D.
pub const REG_RAW_ANGLE_H: u8 = 0x0C;

/// Default 7-bit bus address of the sensor.
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x36;

/// Lower bound (exclusive) of an acceptable update interval, in seconds.
/// Shorter cycles carry too little motion to differentiate reliably.
pub const MIN_VALID_DT_SECS: f32 = 0.0001;

/// Upper bound (exclusive) of an acceptable update interval, in seconds.
/// Longer gaps mean the previous estimate is stale.
pub const MAX_VALID_DT_SECS: f32 = 0.1;

/// Default capacity of the velocity moving-average window.
pub const VELOCITY_WINDOW_SIZE: usize = 5;

/// Microseconds per second, used when converting clock deltas.
pub const MICROS_PER_SEC: f32 = 1_000_000.0;
