//! Parameter types and fixed constants for JPEG encoding.
//!
//! These describe *what* to encode, not *how*. The search constants below are
//! exact: changing any of them changes which quality/resolution a given input
//! settles on, so outputs stop being reproducible across versions.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 85). Clamped on construction.
//! - [`EncodeParams`]: one encode attempt: target dimensions + quality.

/// Quality used by the direct re-encoder for small and in-range images.
pub const REENCODE_QUALITY: Quality = Quality(95);

/// Quality decrement between two attempts of the quality search.
pub const QUALITY_STEP: u32 = 5;

/// The quality search continues only while quality is strictly above this.
pub const QUALITY_FLOOR: u32 = 10;

/// Fixed quality used by the resolution-shrink fallback.
pub const FALLBACK_QUALITY: Quality = Quality(50);

/// Per-step factor applied to both dimensions in the shrink fallback.
pub const SHRINK_FACTOR: f64 = 0.9;

/// Neither output dimension may drop below this in the shrink fallback.
pub const MIN_DIMENSION: u32 = 100;

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder expects.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// One encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn quality_as_u8() {
        assert_eq!(Quality::new(95).as_u8(), 95);
        assert_eq!(Quality(250).as_u8(), 100);
    }

    #[test]
    fn fixed_qualities() {
        assert_eq!(REENCODE_QUALITY.value(), 95);
        assert_eq!(FALLBACK_QUALITY.value(), 50);
    }
}
