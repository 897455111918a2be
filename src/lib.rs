pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod estimation;
pub mod output;
pub mod pipeline;
pub mod sensor;
pub mod trace;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::EstimatorConfig;
pub use error::{EstimatorError, Result};
pub use pipeline::{AngleEstimate, AnglePipeline, CycleOutcome};
pub use sensor::{AngleSensor, As5600, ReplaySensor};
