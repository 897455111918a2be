use super::{Formatter, iso8601_timestamp};
use crate::pipeline::AngleEstimate;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, estimate: &AngleEstimate) -> String {
        format!(
            "{},{},{},{:.2},{:.2},{:.4},{:.4},{:.4}",
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

    fn header(&self) -> Option<&'static str> {
        Some("ts,timestamp_us,raw,angle_deg,filtered_deg,filtered_rad,velocity_rad_s,bias_deg_s")
    }
}
