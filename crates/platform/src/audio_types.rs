//! Audio domain newtypes.
//!
//! - `VolumePercent`: clamps 0–100
//! - `SampleRateHz`: validates 8000–768000 Hz range

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── VolumePercent ────────────────────────────────────────────────────────────

/// Volume as a percentage, clamped to 0–100.
///
/// Wraps a `u8` with the invariant `0 <= value <= 100`.
/// Construct with [`VolumePercent::new`] (clamping) or
/// [`VolumePercent::try_new`] (fallible, strict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumePercent(u8);

impl VolumePercent {
    /// Silence.
    pub const MUTE: Self = Self(0);
    /// Full scale.
    pub const MAX: Self = Self(100);

    /// Create a `VolumePercent`, clamping values above 100 to 100.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Create a `VolumePercent`, returning an error if `value > 100`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value > 100`.
    pub fn try_new(value: u8) -> Result<Self, OutOfRangeError> {
        if value > 100 {
            Err(OutOfRangeError {
                value: u32::from(value),
                min: 0,
                max: 100,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Return the inner volume value (0–100).
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Raise by `step` percentage points, stopping at 100.
    #[must_use]
    pub fn step_up(self, step: u8) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    /// Lower by `step` percentage points, stopping at 0.
    #[must_use]
    pub fn step_down(self, step: u8) -> Self {
        Self(self.0.saturating_sub(step))
    }
}

impl Default for VolumePercent {
    fn default() -> Self {
        Self::MAX
    }
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample rate in Hz, validated to the range the I2S transport can clock.
///
/// Valid range: 8000–768000 Hz (8 kHz to 768 kHz PCM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported sample rate: 8000 Hz (telephony).
    pub const MIN_HZ: u32 = 8_000;

    /// Maximum supported sample rate: 768000 Hz.
    pub const MAX_HZ: u32 = 768_000;

    /// Create a `SampleRateHz`, returning an error if out of 8000–768000 Hz.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 8000` or `hz > 768000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn volume_steps_saturate() {
        assert_eq!(VolumePercent::new(95).step_up(10), VolumePercent::MAX);
        assert_eq!(VolumePercent::new(5).step_down(10), VolumePercent::MUTE);
        assert_eq!(VolumePercent::new(50).step_up(10).get(), 60);
    }

    #[test]
    fn sample_rate_bounds_inclusive() {
        assert!(SampleRateHz::new(SampleRateHz::MIN_HZ).is_ok());
        assert!(SampleRateHz::new(SampleRateHz::MAX_HZ).is_ok());
        assert_eq!(SampleRateHz::new(7_999).unwrap_err().value, 7_999);
    }
}
