use shafttrack::config::EstimatorConfig;
use shafttrack::simulation::{
    MotionProfile, SensorNoiseConfig, TraceConfig, TrackingStats, measure_tracking,
};

const SETTLE_SECS: f32 = 2.0;

/// Shaft rates (rad/s) each noise level is exercised against
const TEST_RATES: [f32; 5] = [-2.0, -0.5, 0.0, 0.5, 2.0];

fn worst_case(
    config: &EstimatorConfig,
    trace: &TraceConfig,
    noise_for: impl Fn(u64) -> SensorNoiseConfig,
) -> TrackingStats {
    let mut worst = TrackingStats::default();

    for (i, &rate) in TEST_RATES.iter().enumerate() {
        let profile = MotionProfile::constant_rate(37.0 * i as f32, rate);
        let noise = noise_for(42 + i as u64);

        match measure_tracking(&profile, trace, &noise, config, SETTLE_SECS) {
            Ok(stats) => {
                worst.updated += stats.updated;
                worst.skipped += stats.skipped;
                worst.failed += stats.failed;
                worst.scored += stats.scored;
                worst.angle_rms_deg = worst.angle_rms_deg.max(stats.angle_rms_deg);
                worst.angle_max_deg = worst.angle_max_deg.max(stats.angle_max_deg);
                worst.velocity_rms = worst.velocity_rms.max(stats.velocity_rms);
                worst.velocity_max = worst.velocity_max.max(stats.velocity_max);
            }
            Err(e) => log::warn!("rate {} rad/s: {}", rate, e),
        }
    }

    worst
}

fn print_row(noise_type: &str, parameter: f32, stats: &TrackingStats) {
    println!(
        "{},{},{:.4},{:.4},{:.4},{:.4},{},{}",
        noise_type,
        parameter,
        stats.angle_rms_deg,
        stats.angle_max_deg,
        stats.velocity_rms,
        stats.velocity_max,
        stats.skipped,
        stats.failed
    );
}

fn run_noise_sweep() {
    println!(
        "noise_type,parameter,angle_rms_deg,angle_max_deg,velocity_rms,velocity_max,skipped,failed"
    );

    let config = EstimatorConfig::default();
    let trace = TraceConfig {
        duration_secs: 10.0,
        ..TraceConfig::default()
    };

    // Count noise sweep
    for tenths in (0..=40).step_by(2) {
        let std_counts = tenths as f32 / 10.0;
        let stats = worst_case(&config, &trace, |seed| {
            let noise = SensorNoiseConfig::default().with_seed(seed);
            if std_counts > 0.0 {
                noise.with_count_noise(std_counts)
            } else {
                noise
            }
        });
        print_row("counts", std_counts, &stats);
    }

    // Timestamp jitter sweep
    for std_us in (0..=5000).step_by(250) {
        let std_us = std_us as f32;
        let stats = worst_case(&config, &trace, |seed| {
            SensorNoiseConfig::default()
                .with_seed(seed)
                .with_count_noise(0.5)
                .with_jitter(std_us)
        });
        print_row("jitter", std_us, &stats);
    }

    // Read failure sweep
    for pct in (0..=50).step_by(5) {
        let probability = pct as f32 / 100.0;
        let stats = worst_case(&config, &trace, |seed| {
            SensorNoiseConfig::default()
                .with_seed(seed)
                .with_count_noise(0.5)
                .with_dropout(probability)
        });
        print_row("dropout", probability, &stats);
    }

    // Scheduler stall sweep (stalls longer than the dt validity window)
    for pct in (0..=20).step_by(2) {
        let probability = pct as f32 / 100.0;
        let stats = worst_case(&config, &trace, |seed| {
            SensorNoiseConfig::default()
                .with_seed(seed)
                .with_count_noise(0.5)
                .with_stalls(probability, 150_000)
        });
        print_row("stall", probability, &stats);
    }
}

fn main() {
    env_logger::init();
    run_noise_sweep();
}
