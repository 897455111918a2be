use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::estimation::wrap_difference;
use crate::trace::replay_trace;

use super::generate::{TraceConfig, generate_trace};
use super::motion::MotionProfile;
use super::noise::SensorNoiseConfig;

/// Signed shortest-path error between two angles in degrees
pub fn angle_error(measured: f32, expected: f32) -> f32 {
    wrap_difference(measured - expected)
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TrackingStats {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Cycles that entered the error statistics
    pub scored: usize,
    pub angle_rms_deg: f32,
    pub angle_max_deg: f32,
    pub velocity_rms: f32,
    pub velocity_max: f32,
}

/// Simulate `profile`, run the estimator over it and score the estimates
/// taken after `settle_secs` against ground truth.
pub fn measure_tracking(
    profile: &MotionProfile,
    trace_config: &TraceConfig,
    noise: &SensorNoiseConfig,
    config: &EstimatorConfig,
    settle_secs: f32,
) -> Result<TrackingStats> {
    let trace = generate_trace(profile, trace_config, noise);
    let steps = replay_trace(&trace, config)?;

    let mut stats = TrackingStats::default();
    let mut angle_sq = 0.0f64;
    let mut velocity_sq = 0.0f64;

    for step in &steps {
        let Some(outcome) = step.outcome else {
            stats.failed += 1;
            continue;
        };
        if !outcome.is_updated() {
            stats.skipped += 1;
            continue;
        }
        stats.updated += 1;

        let t = step.record.timestamp_us.saturating_sub(trace_config.start_us) as f32 / 1_000_000.0;
        if t < settle_secs {
            continue;
        }

        let angle_err =
            angle_error(step.estimate.filtered_degrees, profile.wrapped_angle_at(t)).abs();
        let velocity_err = (step.estimate.velocity - profile.rate_at(t)).abs();

        stats.scored += 1;
        angle_sq += (angle_err as f64).powi(2);
        velocity_sq += (velocity_err as f64).powi(2);
        stats.angle_max_deg = stats.angle_max_deg.max(angle_err);
        stats.velocity_max = stats.velocity_max.max(velocity_err);
    }

    if stats.scored > 0 {
        stats.angle_rms_deg = (angle_sq / stats.scored as f64).sqrt() as f32;
        stats.velocity_rms = (velocity_sq / stats.scored as f64).sqrt() as f32;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_error_wraps() {
        assert!((angle_error(359.0, 1.0) + 2.0).abs() < 1e-4);
        assert!((angle_error(1.0, 359.0) - 2.0).abs() < 1e-4);
        assert!((angle_error(90.0, 80.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_stationary_shaft_tracks_exactly() {
        let profile = MotionProfile::Stationary {
            angle_degrees: 180.0,
        };
        let stats = measure_tracking(
            &profile,
            &TraceConfig::default(),
            &SensorNoiseConfig::default(),
            &EstimatorConfig::default(),
            0.0,
        )
        .unwrap();
        assert_eq!(stats.updated, 99);
        assert_eq!(stats.failed, 0);
        assert!(stats.angle_max_deg < 1e-3);
        assert!(stats.velocity_max < 1e-3);
    }

    #[test]
    fn test_noise_is_smoothed() {
        let profile = MotionProfile::Stationary {
            angle_degrees: 45.0,
        };
        let noise = SensorNoiseConfig::default().with_seed(5).with_count_noise(2.0);
        let trace = TraceConfig {
            duration_secs: 10.0,
            ..TraceConfig::default()
        };
        let stats = measure_tracking(&profile, &trace, &noise, &EstimatorConfig::default(), 2.0)
            .unwrap();
        // 2 counts of noise is ~0.18°; the filter should do better than raw
        assert!(stats.angle_rms_deg < 0.18, "rms {}", stats.angle_rms_deg);
    }
}
