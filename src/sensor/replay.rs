use std::collections::VecDeque;

use crate::error::{EstimatorError, Result};
use crate::estimation::RawSample;
use crate::sensor::AngleSensor;

/// Plays back a recorded sequence of reads; `None` entries fail.
///
/// Once the sequence is exhausted every further read fails.
#[derive(Debug, Clone, Default)]
pub struct ReplaySensor {
    samples: VecDeque<Option<u16>>,
}

impl ReplaySensor {
    pub fn new<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = Option<u16>>,
    {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Queue another read result
    pub fn push(&mut self, sample: Option<u16>) {
        self.samples.push_back(sample);
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl AngleSensor for ReplaySensor {
    fn sample(&mut self) -> Result<RawSample> {
        match self.samples.pop_front() {
            Some(Some(word)) => Ok(RawSample::from_register(word)),
            Some(None) => Err(EstimatorError::SensorUnavailable("recorded read failure".into())),
            None => Err(EstimatorError::SensorUnavailable("replay exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_fails() {
        let mut sensor = ReplaySensor::new([Some(10), None, Some(0xF123)]);
        assert_eq!(sensor.sample().unwrap().counts(), 10);
        assert!(sensor.sample().is_err());
        assert_eq!(sensor.sample().unwrap().counts(), 0x0123);
        assert_eq!(sensor.remaining(), 0);
        assert!(matches!(
            sensor.sample(),
            Err(EstimatorError::SensorUnavailable(_))
        ));
    }

    #[test]
    fn test_push() {
        let mut sensor = ReplaySensor::default();
        sensor.push(Some(7));
        assert_eq!(sensor.sample().unwrap().counts(), 7);
    }
}
