//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, TIFF, WebP) | `image::ImageReader`, content-sniffed |
//! | Normalize | [`canonicalize`](super::normalize::canonicalize) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `jpeg_encoder::Encoder`, optimized Huffman tables |

use super::backend::{BackendError, Decoded, ImageBackend};
use super::normalize::{CanonicalImage, canonicalize};
use super::params::Quality;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use jpeg_encoder::{ColorType, Encoder};
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions accepted by the batch driver and the decoders they map to.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("bmp", ImageFormat::Bmp),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<Decoded, BackendError> {
        // Content sniffing first; a mislabelled .png that is really a JPEG still decodes.
        let img = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| decode_error(path, e))?;
        let (color_mode, image) = canonicalize(img);
        Ok(Decoded { color_mode, image })
    }

    fn resize(&self, image: &CanonicalImage, width: u32, height: u32) -> CanonicalImage {
        CanonicalImage::from_rgb(image::imageops::resize(
            image.as_rgb(),
            width,
            height,
            FilterType::Lanczos3,
        ))
    }

    fn encode_jpeg(
        &self,
        image: &CanonicalImage,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<(), BackendError> {
        let mut encoder = Encoder::new(out, quality.as_u8());
        encoder.set_optimized_huffman_tables(true);
        encode_rgb(encoder, image)
    }
}

/// Feed the canonical RGB buffer to a configured encoder.
fn encode_rgb(
    encoder: Encoder<&mut dyn Write>,
    image: &CanonicalImage,
) -> Result<(), BackendError> {
    let rgb = image.as_rgb();
    let (width, height) = match (u16::try_from(rgb.width()), u16::try_from(rgb.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(BackendError::Encode(format!(
                "{}x{} exceeds the JPEG limit of 65535px per side",
                rgb.width(),
                rgb.height()
            )));
        }
    };
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| BackendError::Encode(e.to_string()))
}
