use crate::estimation::math::wrap_difference;
use crate::estimation::moving_average::MovingAverage;

/// Angular velocity from successive filtered angles.
///
/// Each accepted cycle differentiates the filtered angle along the shortest
/// path, converts to rad/s and pushes the result into a zero-filled moving
/// average. Early readings are pulled toward zero until the window fills.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    window: MovingAverage,
    previous_angle: f32,
    velocity: f32,
    last_instant: f32,
}

impl VelocityEstimator {
    pub fn new(window_size: usize, initial_angle_degrees: f32) -> Self {
        Self {
            window: MovingAverage::new(window_size),
            previous_angle: initial_angle_degrees,
            velocity: 0.0,
            last_instant: 0.0,
        }
    }

    /// Feed the filtered angle from a valid cycle; returns the smoothed rad/s.
    pub fn update(&mut self, filtered_degrees: f32, dt: f32) -> f32 {
        let change = wrap_difference(filtered_degrees - self.previous_angle);
        let instant = change.to_radians() / dt;

        self.last_instant = instant;
        self.velocity = self.window.add(instant);
        self.previous_angle = filtered_degrees;
        self.velocity
    }

    /// Smoothed angular velocity in rad/s
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Most recent unsmoothed velocity in rad/s
    pub fn instantaneous(&self) -> f32 {
        self.last_instant
    }

    pub fn previous_angle(&self) -> f32 {
        self.previous_angle
    }

    pub fn is_window_filled(&self) -> bool {
        self.window.is_filled()
    }

    pub fn reset(&mut self, angle_degrees: f32) {
        self.window.reset();
        self.previous_angle = angle_degrees;
        self.velocity = 0.0;
        self.last_instant = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_velocity_fills_window() {
        let mut est = VelocityEstimator::new(5, 0.0);
        let dt = 0.02;
        let step = 1.0f32; // degrees per cycle
        let expected = step.to_radians() / dt;

        let mut angle = 0.0f32;
        for i in 1..=5 {
            angle += step;
            let v = est.update(angle, dt);
            // zero-filled window: i of 5 slots carry the rate
            assert_abs_diff_eq!(v, expected * i as f32 / 5.0, epsilon = 1e-3);
        }
        assert!(est.is_window_filled());
        assert_abs_diff_eq!(est.velocity(), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_mean_of_latest_five() {
        let mut est = VelocityEstimator::new(5, 0.0);
        let dt = 0.01;
        let steps = [1.0f32, -2.0, 0.5, 3.0, 1.5, -1.0, 2.0];
        let mut angle = 0.0f32;
        let mut instants = Vec::new();
        for step in steps {
            angle += step;
            est.update(angle, dt);
            instants.push(est.instantaneous());
        }
        let expected: f32 = instants[instants.len() - 5..].iter().sum::<f32>() / 5.0;
        assert_abs_diff_eq!(est.velocity(), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_wraparound_forward() {
        let mut est = VelocityEstimator::new(1, 350.0);
        let v = est.update(5.0, 0.02);
        assert_abs_diff_eq!(v, 15.0f32.to_radians() / 0.02, epsilon = 1e-2);
    }

    #[test]
    fn test_wraparound_backward() {
        let mut est = VelocityEstimator::new(1, 5.0);
        let v = est.update(350.0, 0.02);
        assert_abs_diff_eq!(v, -15.0f32.to_radians() / 0.02, epsilon = 1e-2);
    }

    #[test]
    fn test_reset() {
        let mut est = VelocityEstimator::new(5, 0.0);
        est.update(10.0, 0.02);
        est.reset(42.0);
        assert_eq!(est.velocity(), 0.0);
        assert_eq!(est.previous_angle(), 42.0);
        assert!(!est.is_window_filled());
    }
}
