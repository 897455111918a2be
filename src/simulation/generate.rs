use crate::config::UpdateRate;
use crate::trace::TraceRecord;

use super::motion::{MotionProfile, degrees_to_counts};
use super::noise::{NoiseSource, SensorNoiseConfig};

/// Sampling schedule for a synthetic trace
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub duration_secs: f32,
    pub rate: UpdateRate,
    pub start_us: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            rate: UpdateRate::default(),
            start_us: 0,
        }
    }
}

/// Sample `profile` on the nominal schedule, applying count noise, dropouts
/// and timing jitter from `noise`.
pub fn generate_trace(
    profile: &MotionProfile,
    trace: &TraceConfig,
    noise: &SensorNoiseConfig,
) -> Vec<TraceRecord> {
    let period_us = trace.rate.as_interval_us() as f64;
    let num_cycles = (trace.duration_secs as f64 * trace.rate.as_hz() as f64) as usize;
    let mut source = NoiseSource::new(noise);
    let mut records = Vec::with_capacity(num_cycles);
    let mut previous_us = trace.start_us;

    for i in 0..num_cycles {
        let nominal = trace.start_us as f64 + i as f64 * period_us;
        let offset = source.timing_offset_us();
        // Timestamps never run backwards, even after a stall
        let timestamp_us = ((nominal.round() as i64 + offset).max(0) as u64).max(previous_us);
        previous_us = timestamp_us;
        let t = (timestamp_us.saturating_sub(trace.start_us)) as f32 / 1_000_000.0;

        let count_noise = source.count_noise();
        if source.read_fails() {
            records.push(TraceRecord::failure(timestamp_us));
        } else {
            let raw = degrees_to_counts(profile.angle_at(t), count_noise);
            records.push(TraceRecord::sample(timestamp_us, raw));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_length_and_spacing() {
        let profile = MotionProfile::Stationary {
            angle_degrees: 90.0,
        };
        let trace =
            generate_trace(&profile, &TraceConfig::default(), &SensorNoiseConfig::default());
        assert_eq!(trace.len(), 100);
        assert!(trace.iter().all(|r| r.raw == Some(1024)));
        assert_eq!(trace[1].timestamp_us - trace[0].timestamp_us, 20_000);
    }

    #[test]
    fn test_constant_rate_counts_advance() {
        // 10 counts per 20 ms cycle
        let rate = (10.0f32 * 360.0 / 4096.0).to_radians() / 0.02;
        let profile = MotionProfile::constant_rate(0.0, rate);
        let trace =
            generate_trace(&profile, &TraceConfig::default(), &SensorNoiseConfig::default());
        assert_eq!(trace[0].raw, Some(0));
        assert_eq!(trace[1].raw, Some(10));
        assert_eq!(trace[50].raw, Some(500));
    }

    #[test]
    fn test_dropouts_are_marked() {
        let profile = MotionProfile::Stationary { angle_degrees: 0.0 };
        let noise = SensorNoiseConfig::default().with_seed(11).with_dropout(0.5);
        let trace = generate_trace(&profile, &TraceConfig::default(), &noise);
        let failures = trace.iter().filter(|r| r.raw.is_none()).count();
        assert!(failures > 20 && failures < 80, "failures {}", failures);
    }

    #[test]
    fn test_stalls_keep_timestamps_monotonic() {
        let profile = MotionProfile::Stationary { angle_degrees: 0.0 };
        let noise = SensorNoiseConfig::default()
            .with_seed(2)
            .with_jitter(500.0)
            .with_stalls(0.1, 150_000);
        let trace = generate_trace(&profile, &TraceConfig::default(), &noise);
        assert!(trace.windows(2).all(|w| w[1].timestamp_us >= w[0].timestamp_us));
        assert!(
            trace
                .windows(2)
                .any(|w| w[1].timestamp_us - w[0].timestamp_us > 100_000)
        );
    }
}
