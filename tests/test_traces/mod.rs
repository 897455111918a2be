use shafttrack::clock::ManualClock;
use shafttrack::config::EstimatorConfig;
use shafttrack::pipeline::AnglePipeline;
use shafttrack::sensor::ReplaySensor;

pub const DT_US: u64 = 20_000;

pub type ScriptedPipeline<'a> = AnglePipeline<ReplaySensor, &'a ManualClock>;

/// `cycles + 1` raw counts starting at `start`, stepping `step` counts per
/// cycle and wrapping at 4096
pub fn ramp(start: u16, step: i32, cycles: usize) -> Vec<u16> {
    (0..=cycles as i64)
        .map(|i| (start as i64 + i * step as i64).rem_euclid(4096) as u16)
        .collect()
}

/// Pipeline baselined on `samples[0]`, with the rest queued for `update()`
pub fn scripted_pipeline<'a>(samples: &[u16], clock: &'a ManualClock) -> ScriptedPipeline<'a> {
    let sensor = ReplaySensor::new(samples.iter().map(|&s| Some(s)));
    AnglePipeline::initialize(sensor, clock, &EstimatorConfig::default())
        .expect("baseline read")
}

/// Advance the clock by `dt_us` before each remaining queued sample
pub fn run_all(pipeline: &mut ScriptedPipeline<'_>, clock: &ManualClock, dt_us: u64) -> Vec<f32> {
    let mut velocities = Vec::new();
    while pipeline.sensor().remaining() > 0 {
        clock.advance(dt_us);
        pipeline.update().expect("scripted read");
        velocities.push(pipeline.velocity());
    }
    velocities
}

/// Radians per second implied by `step` counts every `dt_us`
pub fn counts_rate(step: i32, dt_us: u64) -> f32 {
    (step as f32 * 360.0 / 4096.0).to_radians() / (dt_us as f32 / 1_000_000.0)
}
