//! Pure calculation functions for the compression search.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{MIN_DIMENSION, QUALITY_FLOOR, QUALITY_STEP, Quality, SHRINK_FACTOR};
use crate::types::SizeClass;

/// Classify an encoded file size against the configured thresholds.
///
/// Both bounds of the normal range are inclusive.
///
/// # Examples
/// ```
/// # use jpegfit::imaging::classify;
/// # use jpegfit::types::SizeClass;
/// assert_eq!(classify(100, 400, 600), SizeClass::Small);
/// assert_eq!(classify(400, 400, 600), SizeClass::Normal);
/// assert_eq!(classify(601, 400, 600), SizeClass::Large);
/// ```
pub fn classify(original_size_bytes: u64, min_size_bytes: u64, max_size_bytes: u64) -> SizeClass {
    if original_size_bytes < min_size_bytes {
        SizeClass::Small
    } else if original_size_bytes <= max_size_bytes {
        SizeClass::Normal
    } else {
        SizeClass::Large
    }
}

/// Area-proportional scale factor: `sqrt(target / original)`.
///
/// An estimate only; JPEG size is not a pure function of pixel count.
pub fn prescale_factor(original_size_bytes: u64, target_size_bytes: u64) -> f64 {
    if original_size_bytes == 0 {
        return 1.0;
    }
    (target_size_bytes as f64 / original_size_bytes as f64).sqrt()
}

/// Dimensions after the initial pre-scale. Each side is rounded and kept ≥ 1.
///
/// # Examples
/// ```
/// # use jpegfit::imaging::prescale_dimensions;
/// // 2000 KB down to 600 KB: scale ≈ 0.5477
/// assert_eq!(prescale_dimensions((1200, 1200), 2000 * 1024, 600 * 1024), (657, 657));
/// ```
pub fn prescale_dimensions(
    original: (u32, u32),
    original_size_bytes: u64,
    target_size_bytes: u64,
) -> (u32, u32) {
    let scale = prescale_factor(original_size_bytes, target_size_bytes);
    let (w, h) = original;
    let scaled = |dim: u32| ((dim as f64 * scale).round() as u32).max(1);
    (scaled(w), scaled(h))
}

/// Qualities tried by the quality search, in order.
///
/// Starts at `initial` and steps down by [`QUALITY_STEP`] while the value
/// stays strictly above [`QUALITY_FLOOR`]. Empty when `initial` is already
/// at or below the floor.
pub fn quality_schedule(initial: Quality) -> Vec<Quality> {
    let mut qualities = Vec::new();
    let mut current = initial.value();
    while current > QUALITY_FLOOR {
        qualities.push(Quality(current));
        current -= QUALITY_STEP;
    }
    qualities
}

/// Next dimensions in the shrink fallback, or `None` once either side would
/// fall below [`MIN_DIMENSION`].
///
/// Each side is multiplied by [`SHRINK_FACTOR`] and truncated.
pub fn shrink_dimensions(current: (u32, u32)) -> Option<(u32, u32)> {
    let (w, h) = current;
    let new_w = (w as f64 * SHRINK_FACTOR) as u32;
    let new_h = (h as f64 * SHRINK_FACTOR) as u32;
    if new_w < MIN_DIMENSION || new_h < MIN_DIMENSION {
        None
    } else {
        Some((new_w, new_h))
    }
}
