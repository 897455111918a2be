//! AS5600 12-bit magnetic rotary position sensor over I2C.
//!
//! Only the raw angle register pair is used: a two-byte big-endian read
//! starting at `0x0C`, masked to the low 12 bits.

use embedded_hal::i2c::{Error as _, I2c};

use crate::config::SensorConfig;
use crate::constants::REG_RAW_ANGLE_H;
use crate::error::{EstimatorError, Result};
use crate::estimation::RawSample;
use crate::sensor::AngleSensor;

pub struct As5600<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C: I2c> As5600<I2C> {
    pub fn new(bus: I2C, config: &SensorConfig) -> Self {
        log::debug!(
            "AS5600 at 0x{:02X} (SDA={}, SCL={}, {} Hz)",
            config.address,
            config.sda_pin,
            config.scl_pin,
            config.bus_clock_hz
        );
        Self {
            bus,
            address: config.address,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the raw angle register pair
    pub fn read_raw_angle(&mut self) -> Result<RawSample> {
        let address = self.address;
        let mut buffer = [0u8; 2];
        self.bus
            .write_read(address, &[REG_RAW_ANGLE_H], &mut buffer)
            .map_err(|e| {
                EstimatorError::SensorUnavailable(format!(
                    "raw angle read from 0x{:02X} failed: {:?}",
                    address,
                    e.kind()
                ))
            })?;
        Ok(RawSample::from_be_bytes(buffer))
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.bus
    }
}

impl<I2C: I2c> AngleSensor for As5600<I2C> {
    fn sample(&mut self) -> Result<RawSample> {
        self.read_raw_angle()
    }
}
