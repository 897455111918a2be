/// Fixed-window moving average over a zero-filled circular buffer
///
/// The mean is always taken over the full window, so until `capacity`
/// samples have been added the output is biased toward zero. The sum is
/// recomputed from the buffer on every call instead of being maintained
/// incrementally, which keeps floating-point error from accumulating.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buffer: Vec<f32>,
    index: usize,
    filled: bool,
}

impl MovingAverage {
    /// Create a new moving average filter
    ///
    /// # Arguments
    /// * `window_size` - Number of samples to average (at least 1)
    pub fn new(window_size: usize) -> Self {
        Self {
            buffer: vec![0.0; window_size.max(1)],
            index: 0,
            filled: false,
        }
    }

    /// Overwrite the oldest slot with `value` and return the updated average
    pub fn add(&mut self, value: f32) -> f32 {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % self.buffer.len();

        if self.index == 0 {
            self.filled = true;
        }

        self.average()
    }

    /// Mean of every slot in the window, including unfilled zeros
    pub fn average(&self) -> f32 {
        let sum: f32 = self.buffer.iter().sum();
        sum / self.buffer.len() as f32
    }

    /// Whether every slot has been written at least once
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut ma = MovingAverage::new(3);

        assert!((ma.add(3.0) - 1.0).abs() < 1e-6); // (3+0+0)/3
        assert!((ma.add(3.0) - 2.0).abs() < 1e-6);
        assert!((ma.add(3.0) - 3.0).abs() < 1e-6);
        assert!((ma.add(6.0) - 4.0).abs() < 1e-6); // (6+3+3)/3
        assert!((ma.add(9.0) - 6.0).abs() < 1e-6); // (6+9+3)/3
    }

    #[test]
    fn test_window_wraps_and_fills() {
        let mut ma = MovingAverage::new(5);
        for i in 0..4 {
            ma.add(i as f32);
            assert!(!ma.is_filled());
        }
        ma.add(4.0);
        assert!(ma.is_filled());
        assert!((ma.average() - 2.0).abs() < 1e-6);

        // The sixth value overwrites the first slot
        assert!((ma.add(10.0) - 4.0).abs() < 1e-6); // (10+1+2+3+4)/5
    }

    #[test]
    fn test_reset() {
        let mut ma = MovingAverage::new(2);
        ma.add(10.0);
        ma.add(20.0);
        ma.reset();
        assert_eq!(ma.average(), 0.0);
        assert!(!ma.is_filled());

        // Writing restarts at the first slot
        assert!((ma.add(4.0) - 2.0).abs() < 1e-6);
        assert!(!ma.is_filled());
        ma.add(4.0);
        assert!(ma.is_filled());
    }

    #[test]
    fn test_zero_window_is_clamped() {
        let mut ma = MovingAverage::new(0);
        assert_eq!(ma.capacity(), 1);
        assert_eq!(ma.add(2.5), 2.5);
    }
}
