use std::f32::consts::PI;

use crate::constants::COUNTS_PER_REVOLUTION;
use crate::estimation::normalize_degrees;

/// Ground-truth shaft motion used to synthesize sensor traces
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionProfile {
    /// Shaft held at a fixed angle
    Stationary { angle_degrees: f32 },
    /// Constant angular rate (positive = increasing counts)
    ConstantRate { start_degrees: f32, rate_rad_s: f32 },
    /// Oscillation about a center angle
    Sinusoidal {
        center_degrees: f32,
        amplitude_degrees: f32,
        frequency_hz: f32,
    },
}

impl MotionProfile {
    pub fn constant_rate(start_degrees: f32, rate_rad_s: f32) -> Self {
        Self::ConstantRate {
            start_degrees,
            rate_rad_s,
        }
    }

    /// Unwrapped angle in degrees at `t` seconds
    pub fn angle_at(&self, t: f32) -> f32 {
        match *self {
            Self::Stationary { angle_degrees } => angle_degrees,
            Self::ConstantRate {
                start_degrees,
                rate_rad_s,
            } => start_degrees + rate_rad_s.to_degrees() * t,
            Self::Sinusoidal {
                center_degrees,
                amplitude_degrees,
                frequency_hz,
            } => center_degrees + amplitude_degrees * (2.0 * PI * frequency_hz * t).sin(),
        }
    }

    /// True angular velocity in rad/s at `t` seconds
    pub fn rate_at(&self, t: f32) -> f32 {
        match *self {
            Self::Stationary { .. } => 0.0,
            Self::ConstantRate { rate_rad_s, .. } => rate_rad_s,
            Self::Sinusoidal {
                amplitude_degrees,
                frequency_hz,
                ..
            } => {
                let omega = 2.0 * PI * frequency_hz;
                amplitude_degrees.to_radians() * omega * (omega * t).cos()
            }
        }
    }

    /// Angle in [0, 360) at `t` seconds
    pub fn wrapped_angle_at(&self, t: f32) -> f32 {
        normalize_degrees(self.angle_at(t))
    }
}

/// Quantize an unwrapped angle (plus extra count noise) to a sensor reading
pub fn degrees_to_counts(degrees: f32, noise_counts: f32) -> u16 {
    let counts = degrees * COUNTS_PER_REVOLUTION as f32 / 360.0 + noise_counts;
    (counts.round() as i64).rem_euclid(COUNTS_PER_REVOLUTION as i64) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rate() {
        let profile = MotionProfile::constant_rate(10.0, PI);
        assert!((profile.angle_at(1.0) - 190.0).abs() < 1e-3);
        assert!((profile.rate_at(0.3) - PI).abs() < 1e-6);
        assert!((profile.wrapped_angle_at(2.0) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_sinusoid_rate_is_derivative() {
        let profile = MotionProfile::Sinusoidal {
            center_degrees: 90.0,
            amplitude_degrees: 30.0,
            frequency_hz: 0.5,
        };
        let t = 0.37;
        let h = 1e-3;
        let numeric = (profile.angle_at(t + h) - profile.angle_at(t - h)).to_radians() / (2.0 * h);
        assert!((numeric - profile.rate_at(t)).abs() < 1e-2);
    }

    #[test]
    fn test_degrees_to_counts_wraps() {
        assert_eq!(degrees_to_counts(0.0, 0.0), 0);
        assert_eq!(degrees_to_counts(180.0, 0.0), 2048);
        assert_eq!(degrees_to_counts(360.0, 0.0), 0);
        assert_eq!(degrees_to_counts(-360.0 / 4096.0, 0.0), 4095);
        assert_eq!(degrees_to_counts(0.0, -2.0), 4094);
    }

    #[test]
    fn test_profile_from_toml() {
        let profile: MotionProfile =
            toml::from_str("type = \"constant_rate\"\nstart_degrees = 0.0\nrate_rad_s = 2.0\n")
                .unwrap();
        assert_eq!(profile, MotionProfile::constant_rate(0.0, 2.0));
    }
}
