//! Image compression engine: pure Rust, no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + normalize** | `image::ImageReader`, alpha flattened onto white |
//! | **Classify** | byte size vs. min/max thresholds |
//! | **Resize** | Lanczos3 (`image::imageops::resize`) |
//! | **Encode** | `jpeg_encoder::Encoder` with optimized Huffman tables |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for classification, scaling and the search schedule (unit testable)
//! - **Parameters**: Quality type and the fixed search constants
//! - **Normalize**: Canonical RGB representation and alpha flattening
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Re-encode, budget fitting and the single-file dispatch

pub mod backend;
mod calculations;
pub mod normalize;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Decoded, ImageBackend};
pub use calculations::{
    classify, prescale_dimensions, prescale_factor, quality_schedule, shrink_dimensions,
};
pub use normalize::CanonicalImage;
pub use operations::{
    CompressError, Compressed, Encoded, compress_image, fit_to_budget, normalize, reencode,
};
pub use params::{
    EncodeParams, FALLBACK_QUALITY, MIN_DIMENSION, QUALITY_FLOOR, QUALITY_STEP, Quality,
    REENCODE_QUALITY, SHRINK_FACTOR,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
