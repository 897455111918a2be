//! Configuration for the shaft angle estimator.
//!
//! All sections can be loaded from TOML; any field left out keeps its default.
//!
//! ```toml
//! [sensor]
//! address = 0x36
//! device = "/dev/i2c-1"
//!
//! [kalman]
//! r_measure = 0.05
//!
//! [timing]
//! update_rate = "50hz"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_SENSOR_ADDRESS, MAX_VALID_DT_SECS, MIN_VALID_DT_SECS, VELOCITY_WINDOW_SIZE,
};
use crate::error::{EstimatorError, Result};

/// Update cadence of the outer scheduling loop
///
/// Can be specified as either a frequency in Hz or a period.
///
/// # Parsing formats
/// - `50` - frequency in Hz (no suffix)
/// - `50hz` or `50Hz` - frequency in Hz (explicit)
/// - `20ms` - period in milliseconds
/// - `20000us` or `20000μs` - period in microseconds
///
/// # Example
/// ```
/// use shafttrack::config::UpdateRate;
///
/// let rate: UpdateRate = "20ms".parse().unwrap();
/// assert!((rate.as_hz() - 50.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRate(f32);

impl UpdateRate {
    /// Create from frequency in Hz
    pub fn from_hz(hz: f32) -> Self {
        Self(hz)
    }

    /// Create from period in microseconds
    pub fn from_interval_us(us: f32) -> Self {
        Self(1_000_000.0 / us)
    }

    /// Get frequency in Hz
    pub fn as_hz(&self) -> f32 {
        self.0
    }

    /// Get period in microseconds
    pub fn as_interval_us(&self) -> f32 {
        1_000_000.0 / self.0
    }

    /// Get the loop period, or `None` when it is zero or not representable
    pub fn as_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f32(1.0 / self.0)
            .ok()
            .filter(|period| !period.is_zero())
    }

    /// Check that the rate is finite, positive and has a usable period
    pub fn check(&self) -> std::result::Result<(), String> {
        if !(self.0.is_finite() && self.0 > 0.0) {
            return Err(format!("rate must be finite and positive, got {}", self.0));
        }
        if self.as_duration().is_none() {
            return Err(format!("rate {} hz has no usable period", self.0));
        }
        Ok(())
    }
}

impl Default for UpdateRate {
    fn default() -> Self {
        Self::from_hz(50.0)
    }
}

impl fmt::Display for UpdateRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}hz", self.0)
    }
}

impl FromStr for UpdateRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        let interval_us = if let Some(num) = s.strip_suffix("ms") {
            Some((num, 1000.0))
        } else {
            s.strip_suffix("us")
                .or_else(|| s.strip_suffix("μs"))
                .map(|num| (num, 1.0))
        };

        if let Some((num, scale)) = interval_us {
            let value: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid interval: {}", s))?;
            if !(value.is_finite() && value > 0.0) {
                return Err("interval must be finite and positive".to_string());
            }
            let rate = Self::from_interval_us(value * scale);
            rate.check()?;
            return Ok(rate);
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid rate: {}", s))?;
        let rate = Self::from_hz(hz);
        rate.check()?;
        Ok(rate)
    }
}

impl<'de> Deserialize<'de> for UpdateRate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hz(f32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Hz(hz) => {
                let rate = Self::from_hz(hz);
                rate.check().map_err(serde::de::Error::custom)?;
                Ok(rate)
            }
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Estimator configuration
///
/// Use `EstimatorConfig::default()` for the reference tuning (AS5600 on the
/// default bus, 50 Hz cadence).
///
/// # Example
/// ```
/// use shafttrack::config::EstimatorConfig;
///
/// let mut config = EstimatorConfig::default();
/// config.kalman.r_measure = 0.05;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Sensor bus selection
    pub sensor: SensorConfig,
    /// Kalman filter noise tuning
    pub kalman: KalmanConfig,
    /// Velocity smoothing
    pub velocity: VelocityConfig,
    /// Cycle timing validity and cadence
    pub timing: TimingConfig,
}

/// Bus identity and device address
///
/// Selects which physical bus and which device on that bus are queried.
/// The pin designators describe the bus on microcontroller targets; on a
/// Linux host the bus is chosen by `device` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Data line pin designator
    pub sda_pin: u8,
    /// Clock line pin designator
    pub scl_pin: u8,
    /// 7-bit device address on the bus
    pub address: u8,
    /// Bus clock in Hz
    pub bus_clock_hz: u32,
    /// Host bus device node (Linux only)
    pub device: String,
}

/// Kalman filter noise constants
///
/// Smaller `r_measure` trusts raw samples more; smaller process noise trusts
/// the drift-free motion model more.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// Process noise on the angle state
    pub q_angle: f32,
    /// Process noise on the bias state
    pub q_bias: f32,
    /// Measurement noise
    pub r_measure: f32,
}

/// Velocity moving-average configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Number of instantaneous samples averaged
    pub window: usize,
}

/// Cycle timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Exclusive lower bound on a valid update interval (seconds)
    pub min_dt_secs: f32,
    /// Exclusive upper bound on a valid update interval (seconds)
    pub max_dt_secs: f32,
    /// Cadence used by the driver loop
    pub update_rate: UpdateRate,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sda_pin: 21,
            scl_pin: 22,
            address: DEFAULT_SENSOR_ADDRESS,
            bus_clock_hz: 400_000,
            device: "/dev/i2c-1".to_string(),
        }
    }
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            q_angle: 0.001,
            q_bias: 0.003,
            r_measure: 0.03,
        }
    }
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            window: VELOCITY_WINDOW_SIZE,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_dt_secs: MIN_VALID_DT_SECS,
            max_dt_secs: MAX_VALID_DT_SECS,
            update_rate: UpdateRate::default(),
        }
    }
}

impl EstimatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EstimatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Reject tunings the estimator cannot run with
    pub fn validate(&self) -> Result<()> {
        let k = &self.kalman;
        if !(k.q_angle > 0.0 && k.q_bias > 0.0 && k.r_measure > 0.0) {
            return Err(EstimatorError::Config(format!(
                "noise constants must be positive (q_angle={}, q_bias={}, r_measure={})",
                k.q_angle, k.q_bias, k.r_measure
            )));
        }
        if self.velocity.window == 0 {
            return Err(EstimatorError::Config(
                "velocity window must hold at least one sample".into(),
            ));
        }
        let t = &self.timing;
        if !(t.min_dt_secs >= 0.0 && t.max_dt_secs > t.min_dt_secs) {
            return Err(EstimatorError::Config(format!(
                "invalid dt window ({}, {})",
                t.min_dt_secs, t.max_dt_secs
            )));
        }
        t.update_rate
            .check()
            .map_err(|e| EstimatorError::Config(format!("update_rate: {}", e)))?;
        if self.sensor.address > 0x7F {
            return Err(EstimatorError::Config(format!(
                "address 0x{:02X} is not a 7-bit address",
                self.sensor.address
            )));
        }
        Ok(())
    }
}
