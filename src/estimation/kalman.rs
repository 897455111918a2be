use crate::config::KalmanConfig;
use crate::estimation::math::{normalize_degrees, unwrap_toward};

/// Filter state: angle estimate, drift bias and their covariance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    /// Filtered angle in degrees, always within [0, 360)
    pub angle: f32,
    /// Drift-rate estimate in degrees per second
    pub bias: f32,
    /// Row-major 2x2 error covariance
    pub covariance: [[f32; 2]; 2],
}

/// Two-state (angle + drift bias) Kalman filter over a circular angle.
///
/// Each update wraps the measurement onto the side of the circle nearest the
/// current estimate, predicts with the bias model, then corrects. The
/// covariance correction uses the row-scaled form
/// `P00 -= K0*P00, P01 -= K0*P01, P10 -= K1*P00, P11 -= K1*P01`
/// rather than a symmetric Joseph update; it is kept as-is because changing it
/// changes the filter dynamics.
#[derive(Debug, Clone)]
pub struct AngleKalman {
    state: KalmanState,
    q_angle: f32,
    q_bias: f32,
    r_measure: f32,
}

impl AngleKalman {
    /// Start from a known angle with zero bias and identity covariance.
    ///
    /// Seeding with the first sample avoids the filter lag a cold start would
    /// otherwise add.
    pub fn new(config: &KalmanConfig, initial_degrees: f32) -> Self {
        Self {
            state: KalmanState {
                angle: normalize_degrees(initial_degrees),
                bias: 0.0,
                covariance: [[1.0, 0.0], [0.0, 1.0]],
            },
            q_angle: config.q_angle,
            q_bias: config.q_bias,
            r_measure: config.r_measure,
        }
    }

    /// Fuse one measurement (degrees) taken `dt` seconds after the previous one.
    ///
    /// Returns the new filtered angle in [0, 360).
    pub fn update(&mut self, measurement_degrees: f32, dt: f32) -> f32 {
        let KalmanState {
            mut angle,
            mut bias,
            covariance: mut p,
        } = self.state;

        let measurement = unwrap_toward(measurement_degrees, angle);

        // Predict
        angle -= bias * dt;
        p[0][0] += self.q_angle * dt;
        p[0][1] -= self.q_bias * dt;
        p[1][0] -= self.q_bias * dt;
        p[1][1] += self.q_bias * dt;

        // Correct
        let innovation = measurement - angle;
        let s = p[0][0] + self.r_measure;
        let k0 = p[0][0] / s;
        let k1 = p[1][0] / s;

        angle += k0 * innovation;
        bias += k1 * innovation;

        let p00 = p[0][0];
        let p01 = p[0][1];
        p[0][0] -= k0 * p00;
        p[0][1] -= k0 * p01;
        p[1][0] -= k1 * p00;
        p[1][1] -= k1 * p01;

        self.state = KalmanState {
            angle: normalize_degrees(angle),
            bias,
            covariance: p,
        };
        self.state.angle
    }

    /// Re-seed the filter, discarding bias and covariance history.
    pub fn reset(&mut self, initial_degrees: f32) {
        self.state = KalmanState {
            angle: normalize_degrees(initial_degrees),
            bias: 0.0,
            covariance: [[1.0, 0.0], [0.0, 1.0]],
        };
    }

    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    pub fn bias(&self) -> f32 {
        self.state.bias
    }

    pub fn covariance(&self) -> [[f32; 2]; 2] {
        self.state.covariance
    }

    pub fn state(&self) -> KalmanState {
        self.state
    }
}
