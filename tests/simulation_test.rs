use shafttrack::config::EstimatorConfig;
use shafttrack::simulation::{
    MotionProfile, SensorNoiseConfig, TraceConfig, generate_trace, measure_tracking,
};
use shafttrack::trace::{read_trace, replay_trace, write_trace};

const SETTLE_SECS: f32 = 2.0;

fn ten_seconds() -> TraceConfig {
    TraceConfig {
        duration_secs: 10.0,
        ..TraceConfig::default()
    }
}

#[test]
fn test_velocity_tracks_constant_rates() {
    let config = EstimatorConfig::default();

    for rate in [-2.0f32, -0.5, 0.5, 2.0] {
        let profile = MotionProfile::constant_rate(0.0, rate);
        let stats = measure_tracking(
            &profile,
            &ten_seconds(),
            &SensorNoiseConfig::default(),
            &config,
            SETTLE_SECS,
        )
        .unwrap();

        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.failed, 0);
        assert!(stats.scored > 350);
        assert!(
            stats.velocity_rms < 0.15 * rate.abs(),
            "rate {}: velocity rms {}",
            rate,
            stats.velocity_rms
        );
    }
}

#[test]
fn test_direction_does_not_change_tracking() {
    let config = EstimatorConfig::default();
    let measure = |rate: f32| {
        measure_tracking(
            &MotionProfile::constant_rate(180.0, rate),
            &ten_seconds(),
            &SensorNoiseConfig::default(),
            &config,
            SETTLE_SECS,
        )
        .unwrap()
    };

    let forward = measure(1.0);
    let reverse = measure(-1.0);
    assert!(
        (forward.angle_rms_deg - reverse.angle_rms_deg).abs() < 0.1 * forward.angle_rms_deg,
        "forward {} reverse {}",
        forward.angle_rms_deg,
        reverse.angle_rms_deg
    );
}

#[test]
fn test_dropouts_do_not_disturb_velocity() {
    let profile = MotionProfile::constant_rate(0.0, 1.0);
    let noise = SensorNoiseConfig::default().with_seed(17).with_dropout(0.2);
    let stats = measure_tracking(
        &profile,
        &ten_seconds(),
        &noise,
        &EstimatorConfig::default(),
        SETTLE_SECS,
    )
    .unwrap();

    assert!(stats.failed > 50, "failed {}", stats.failed);
    assert!(stats.velocity_rms < 0.2, "velocity rms {}", stats.velocity_rms);
}

#[test]
fn test_stalls_are_skipped_without_divergence() {
    let profile = MotionProfile::constant_rate(0.0, 1.0);
    let noise = SensorNoiseConfig::default()
        .with_seed(23)
        .with_stalls(0.05, 150_000);
    let stats = measure_tracking(
        &profile,
        &ten_seconds(),
        &noise,
        &EstimatorConfig::default(),
        SETTLE_SECS,
    )
    .unwrap();

    assert!(stats.skipped > 0);
    assert!(stats.angle_max_deg < 120.0, "angle max {}", stats.angle_max_deg);
    assert!(stats.velocity_max < 8.0, "velocity max {}", stats.velocity_max);
}

#[test]
fn test_count_noise_costs_little_accuracy() {
    let profile = MotionProfile::constant_rate(0.0, 1.0);
    let config = EstimatorConfig::default();
    let clean = measure_tracking(
        &profile,
        &ten_seconds(),
        &SensorNoiseConfig::default(),
        &config,
        SETTLE_SECS,
    )
    .unwrap();
    let noisy = measure_tracking(
        &profile,
        &ten_seconds(),
        &SensorNoiseConfig::default().with_seed(4).with_count_noise(2.0),
        &config,
        SETTLE_SECS,
    )
    .unwrap();

    assert!(
        (noisy.angle_rms_deg - clean.angle_rms_deg).abs() < 0.5,
        "clean {} noisy {}",
        clean.angle_rms_deg,
        noisy.angle_rms_deg
    );
}

#[test]
fn test_trace_file_replays_identically() {
    let profile = MotionProfile::Sinusoidal {
        center_degrees: 10.0,
        amplitude_degrees: 40.0,
        frequency_hz: 0.5,
    };
    let noise = SensorNoiseConfig::default()
        .with_seed(8)
        .with_count_noise(1.0)
        .with_dropout(0.05)
        .with_jitter(300.0);
    let records = generate_trace(&profile, &ten_seconds(), &noise);

    let path = std::env::temp_dir().join(format!("shafttrack_trace_{}.csv", std::process::id()));
    write_trace(&path, &records).unwrap();
    let loaded = read_trace(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, records);

    let config = EstimatorConfig::default();
    let direct = replay_trace(&records, &config).unwrap();
    let from_file = replay_trace(&loaded, &config).unwrap();
    assert_eq!(direct.len(), from_file.len());
    for (a, b) in direct.iter().zip(&from_file) {
        assert_eq!(a.estimate, b.estimate);
    }
}
