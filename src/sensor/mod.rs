pub mod as5600;
pub mod replay;

pub use as5600::As5600;
pub use replay::ReplaySensor;

use crate::error::Result;
use crate::estimation::RawSample;

/// Source of absolute shaft position samples.
///
/// Implementations mask to 12 bits and report a failed read as
/// `EstimatorError::SensorUnavailable` without retrying.
pub trait AngleSensor {
    fn sample(&mut self) -> Result<RawSample>;
}

impl<S: AngleSensor + ?Sized> AngleSensor for Box<S> {
    fn sample(&mut self) -> Result<RawSample> {
        (**self).sample()
    }
}
