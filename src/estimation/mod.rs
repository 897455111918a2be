pub mod gate;
pub mod kalman;
pub mod math;
pub mod moving_average;
pub mod velocity;

pub use gate::{CycleGate, CycleTiming};
pub use kalman::{AngleKalman, KalmanState};
pub use math::{
    RawSample, counts_to_degrees, normalize_degrees, revolution_offset, unwrap_toward,
    wrap_difference,
};
pub use moving_average::MovingAverage;
pub use velocity::VelocityEstimator;
