//! Shared types used across the imaging engine, the batch driver and the
//! report writer.
//!
//! The serializable ones end up in the JSON batch report, so their field
//! names are part of the output format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Color layout of a decoded source image, before normalization.
///
/// Palette images never show up here: the format decoders expand them,
/// to [`TruecolorAlpha`](ColorMode::TruecolorAlpha) when the palette carries
/// transparency and to [`Truecolor`](ColorMode::Truecolor) otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Truecolor,
    TruecolorAlpha,
    Grayscale,
    GrayscaleAlpha,
    /// Deep (16-bit, float) RGB and anything unrecognized.
    Other,
}

impl ColorMode {
    /// Whether normalization has to composite onto a white canvas.
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::TruecolorAlpha | ColorMode::GrayscaleAlpha)
    }
}

/// A source file as found on disk. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Encoded size on disk, measured before decoding.
    pub original_size: u64,
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
}

/// Which compression strategy applies to a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// Below the minimum size: re-encoded at high quality.
    Small,
    /// Within `[min, max]`: re-encoded at high quality.
    Normal,
    /// Above the maximum: fitted to the byte budget.
    Large,
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SizeClass::Small => "small",
            SizeClass::Normal => "normal",
            SizeClass::Large => "large",
        };
        f.write_str(name)
    }
}

/// Byte thresholds and starting quality for one batch run.
///
/// `target_size_bytes` always equals `max_size_bytes`: the upper
/// classification bound doubles as the budget for large images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionTarget {
    pub min_size_bytes: u64,
    pub max_size_bytes: u64,
    pub target_size_bytes: u64,
    pub initial_quality: crate::imaging::Quality,
}

impl CompressionTarget {
    /// Build a target from KiB thresholds.
    ///
    /// Byte counts saturate at `u64::MAX`; configuration validation rejects
    /// thresholds that large before a target is ever built.
    pub fn from_kb(min_size_kb: u64, max_size_kb: u64, initial_quality: u32) -> Self {
        let max_size_bytes = max_size_kb.saturating_mul(1024);
        Self {
            min_size_bytes: min_size_kb.saturating_mul(1024),
            max_size_bytes,
            target_size_bytes: max_size_bytes,
            initial_quality: crate::imaging::Quality::new(initial_quality),
        }
    }
}

impl Default for CompressionTarget {
    fn default() -> Self {
        Self::from_kb(400, 600, 85)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_from_kb_uses_binary_kilobytes() {
        let t = CompressionTarget::from_kb(400, 600, 85);
        assert_eq!(t.min_size_bytes, 409_600);
        assert_eq!(t.max_size_bytes, 614_400);
        assert_eq!(t.target_size_bytes, t.max_size_bytes);
        assert_eq!(t.initial_quality.value(), 85);
    }

    #[test]
    fn target_from_kb_saturates_instead_of_overflowing() {
        let t = CompressionTarget::from_kb(1 << 60, u64::MAX, 85);
        assert_eq!(t.min_size_bytes, u64::MAX);
        assert_eq!(t.max_size_bytes, u64::MAX);
        assert_eq!(t.target_size_bytes, u64::MAX);
    }

    #[test]
    fn target_default_matches_stock_thresholds() {
        assert_eq!(CompressionTarget::default(), CompressionTarget::from_kb(400, 600, 85));
    }

    #[test]
    fn color_mode_alpha() {
        assert!(ColorMode::TruecolorAlpha.has_alpha());
        assert!(ColorMode::GrayscaleAlpha.has_alpha());
        assert!(!ColorMode::Truecolor.has_alpha());
        assert!(!ColorMode::Grayscale.has_alpha());
        assert!(!ColorMode::Other.has_alpha());
    }

    #[test]
    fn size_class_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SizeClass::Large).unwrap(), "\"large\"");
        assert_eq!(SizeClass::Normal.to_string(), "normal");
    }
}
