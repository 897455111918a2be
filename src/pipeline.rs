use crate::clock::Clock;
use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::estimation::{
    AngleKalman, CycleGate, CycleTiming, KalmanState, RawSample, VelocityEstimator,
};
use crate::sensor::AngleSensor;

/// What a successful update cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Filter and velocity were advanced by `dt` seconds
    Updated { dt: f32 },
    /// `dt` fell outside the validity window; estimates were left untouched
    Skipped { dt: f32 },
}

impl CycleOutcome {
    pub fn dt(&self) -> f32 {
        match self {
            Self::Updated { dt } | Self::Skipped { dt } => *dt,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Snapshot of every public output of the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleEstimate {
    /// Clock reading of the last cycle, in microseconds
    pub timestamp_us: u64,
    pub raw: RawSample,
    /// Unfiltered angle of the last sample
    pub angle_degrees: f32,
    pub filtered_degrees: f32,
    /// Smoothed angular velocity in rad/s
    pub velocity: f32,
    /// Drift-rate estimate in deg/s
    pub bias: f32,
}

impl AngleEstimate {
    pub fn angle_radians(&self) -> f32 {
        self.angle_degrees.to_radians()
    }

    pub fn filtered_radians(&self) -> f32 {
        self.filtered_degrees.to_radians()
    }
}

/// Per-outcome cycle counts since initialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounters {
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Sensor → Kalman angle → velocity, once per caller-initiated cycle.
///
/// The pipeline owns all estimator state and has no timer of its own; the
/// caller decides the cadence. A failed sensor read leaves every estimate
/// exactly as it was.
pub struct AnglePipeline<S, C> {
    sensor: S,
    clock: C,
    kalman: AngleKalman,
    velocity: VelocityEstimator,
    gate: CycleGate,
    raw: RawSample,
    angle_degrees: f32,
    counters: CycleCounters,
}

impl<S: AngleSensor, C: Clock> AnglePipeline<S, C> {
    /// Take a baseline reading and build a fully initialized pipeline.
    ///
    /// The filtered angle starts at the baseline sample, bias at zero and
    /// covariance at identity, so the first estimate carries no filter lag.
    pub fn initialize(mut sensor: S, clock: C, config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let start_us = clock.now_micros();
        let raw = sensor.sample()?;
        let degrees = raw.degrees();

        log::info!(
            "Baseline {} counts ({:.2}°) at t={}us",
            raw.counts(),
            degrees,
            start_us
        );

        Ok(Self {
            sensor,
            clock,
            kalman: AngleKalman::new(&config.kalman, degrees),
            velocity: VelocityEstimator::new(config.velocity.window, degrees),
            gate: CycleGate::new(&config.timing, start_us),
            raw,
            angle_degrees: degrees,
            counters: CycleCounters::default(),
        })
    }

    /// Repeat the baseline reading on a running pipeline.
    ///
    /// On failure nothing but the failure counter changes.
    pub fn rebaseline(&mut self) -> Result<()> {
        let now_us = self.clock.now_micros();
        let raw = match self.sensor.sample() {
            Ok(raw) => raw,
            Err(e) => {
                self.counters.failed += 1;
                return Err(e);
            }
        };
        let degrees = raw.degrees();

        self.kalman.reset(degrees);
        self.velocity.reset(degrees);
        self.gate.reset(now_us);
        self.raw = raw;
        self.angle_degrees = degrees;

        log::info!("Re-baselined at {} counts ({:.2}°)", raw.counts(), degrees);
        Ok(())
    }

    /// Run one cycle: read the sensor, time the cycle, update the estimators.
    pub fn update(&mut self) -> Result<CycleOutcome> {
        let raw = match self.sensor.sample() {
            Ok(raw) => raw,
            Err(e) => {
                self.counters.failed += 1;
                log::trace!("Sensor read failed: {}", e);
                return Err(e);
            }
        };
        let now_us = self.clock.now_micros();
        Ok(self.apply_sample(raw, now_us))
    }

    /// Second half of a cycle for a sample that has already been read at `now_us`.
    pub fn apply_sample(&mut self, raw: RawSample, now_us: u64) -> CycleOutcome {
        self.raw = raw;
        self.angle_degrees = raw.degrees();

        match self.gate.advance(now_us) {
            CycleTiming::Valid(dt) => {
                let filtered = self.kalman.update(self.angle_degrees, dt);
                let velocity = self.velocity.update(filtered, dt);
                self.counters.updated += 1;
                log::trace!(
                    "dt={:.6}s raw={} filtered={:.3}° velocity={:.4} rad/s",
                    dt,
                    raw.counts(),
                    filtered,
                    velocity
                );
                CycleOutcome::Updated { dt }
            }
            CycleTiming::Rejected(dt) => {
                self.counters.skipped += 1;
                log::debug!("Skipping cycle: dt={:.6}s outside validity window", dt);
                CycleOutcome::Skipped { dt }
            }
        }
    }

    pub fn raw(&self) -> RawSample {
        self.raw
    }

    pub fn angle_degrees(&self) -> f32 {
        self.angle_degrees
    }

    pub fn angle_radians(&self) -> f32 {
        self.angle_degrees.to_radians()
    }

    pub fn filtered_degrees(&self) -> f32 {
        self.kalman.angle()
    }

    pub fn filtered_radians(&self) -> f32 {
        self.kalman.angle().to_radians()
    }

    /// Smoothed angular velocity in rad/s
    pub fn velocity(&self) -> f32 {
        self.velocity.velocity()
    }

    pub fn kalman_state(&self) -> KalmanState {
        self.kalman.state()
    }

    pub fn last_update_us(&self) -> u64 {
        self.gate.last_update_us()
    }

    pub fn counters(&self) -> CycleCounters {
        self.counters
    }

    pub fn estimate(&self) -> AngleEstimate {
        AngleEstimate {
            timestamp_us: self.gate.last_update_us(),
            raw: self.raw,
            angle_degrees: self.angle_degrees,
            filtered_degrees: self.kalman.angle(),
            velocity: self.velocity.velocity(),
            bias: self.kalman.bias(),
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
