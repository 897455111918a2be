mod generate;
mod measure;
mod motion;
mod noise;

pub use generate::{TraceConfig, generate_trace};
pub use measure::{TrackingStats, angle_error, measure_tracking};
pub use motion::{MotionProfile, degrees_to_counts};
pub use noise::{CountNoiseConfig, DropoutConfig, SensorNoiseConfig, TimingJitterConfig};
