use super::{Formatter, iso8601_timestamp};
use crate::pipeline::AngleEstimate;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, estimate: &AngleEstimate) -> String {
        format!(
            r#"{{"ts":"{}","timestamp_us":{},"raw":{},"angle_deg":{:.2},"filtered_deg":{:.2},"filtered_rad":{:.4},"velocity":{:.4},"bias":{:.4}}}"#,
            iso8601_timestamp(),
            estimate.timestamp_us,
            estimate.raw.counts(),
            estimate.angle_degrees,
            estimate.filtered_degrees,
            estimate.filtered_radians(),
            estimate.velocity,
            estimate.bias
        )
    }
}
