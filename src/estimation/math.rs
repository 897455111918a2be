use crate::constants::{COUNTS_PER_REVOLUTION, RAW_ANGLE_MASK};

/// Absolute shaft position in sensor counts, always within [0, 4095].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawSample(u16);

impl RawSample {
    /// Build from a raw register word, keeping only the low 12 bits.
    pub fn from_register(word: u16) -> Self {
        Self(word & RAW_ANGLE_MASK)
    }

    /// Build from big-endian register bytes.
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self::from_register(u16::from_be_bytes(bytes))
    }

    pub fn counts(self) -> u16 {
        self.0
    }

    pub fn degrees(self) -> f32 {
        counts_to_degrees(self.0)
    }

    pub fn radians(self) -> f32 {
        self.degrees().to_radians()
    }
}

impl From<u16> for RawSample {
    fn from(word: u16) -> Self {
        Self::from_register(word)
    }
}

/// Convert sensor counts to degrees in [0, 360)
pub fn counts_to_degrees(counts: u16) -> f32 {
    (counts & RAW_ANGLE_MASK) as f32 * 360.0 / COUNTS_PER_REVOLUTION as f32
}

/// Bring an angle into [0, 360)
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Whole-revolution adjustment (-360, 0 or +360) that brings an angular
/// difference back within ±180°.
pub fn revolution_offset(diff_degrees: f32) -> f32 {
    if diff_degrees > 180.0 {
        -360.0
    } else if diff_degrees < -180.0 {
        360.0
    } else {
        0.0
    }
}

/// Shortest-path correction of an angular difference.
///
/// Differences beyond ±180° are moved by one revolution so that a step across
/// the 0°/360° boundary reads as the short way round.
pub fn wrap_difference(diff_degrees: f32) -> f32 {
    diff_degrees + revolution_offset(diff_degrees)
}

/// Move `measurement` by a revolution if that puts it within 180° of `reference`.
pub fn unwrap_toward(measurement: f32, reference: f32) -> f32 {
    measurement + revolution_offset(measurement - reference)
}
