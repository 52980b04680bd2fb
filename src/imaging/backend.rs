//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the
//! compression engine needs: decode, resize and JPEG encode. Everything
//! above it (classification, the quality search, the shrink fallback, temp
//! file handling) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, statically
//! linked.

use super::normalize::CanonicalImage;
use super::params::Quality;
use crate::types::ColorMode;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

/// A decoded, normalized image plus the color mode it was stored in.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub color_mode: ColorMode,
    pub image: CanonicalImage,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by rayon workers.
pub trait ImageBackend: Sync {
    /// Decode a file and normalize it to opaque RGB.
    fn decode(&self, path: &Path) -> Result<Decoded, BackendError>;

    /// Resample to exactly `width`×`height`.
    fn resize(&self, image: &CanonicalImage, width: u32, height: u32) -> CanonicalImage;

    /// Encode as baseline JPEG with optimized Huffman tables into `out`.
    fn encode_jpeg(
        &self,
        image: &CanonicalImage,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError>;
}
