use super::Formatter;
use crate::pipeline::AngleEstimate;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, estimate: &AngleEstimate) -> String {
        if self.verbose {
            format!(
                "Angle: {:>7.2}° ({:>6.4} rad, raw: {:>4} = {:>7.2}°) velocity: {:>8.3} rad/s [bias: {:>8.4}°/s, t: {} us]",
                estimate.filtered_degrees,
                estimate.filtered_radians(),
                estimate.raw.counts(),
                estimate.angle_degrees,
                estimate.velocity,
                estimate.bias,
                estimate.timestamp_us
            )
        } else {
            format!(
                "Angle: {:>7.2}° (raw: {:>4}) velocity: {:>8.3} rad/s",
                estimate.filtered_degrees,
                estimate.raw.counts(),
                estimate.velocity
            )
        }
    }
}
