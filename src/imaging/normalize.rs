//! Canonical pixel representation.
//!
//! Every decoded image is brought into the same shape before any resizing or
//! encoding happens: 8-bit, 3-channel RGB with no transparency. Alpha is
//! collapsed onto an opaque white canvas; every other layout goes through the
//! `image` crate's standard color conversion.

use crate::types::ColorMode;
use image::{ColorType, DynamicImage, Rgb, RgbImage, RgbaImage};

/// Opaque 8-bit RGB pixels, ready for the JPEG encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalImage(RgbImage);

impl CanonicalImage {
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self(pixels)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }
}

/// Map a decoder color type onto the source color modes we distinguish.
pub fn color_mode(color: ColorType) -> ColorMode {
    match color {
        ColorType::Rgb8 => ColorMode::Truecolor,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::TruecolorAlpha,
        ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
        ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
        _ => ColorMode::Other,
    }
}

/// Convert any decoded image into a [`CanonicalImage`].
///
/// Returns the source color mode alongside so callers can report it.
pub fn canonicalize(img: DynamicImage) -> (ColorMode, CanonicalImage) {
    let mode = color_mode(img.color());
    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other if mode.has_alpha() => flatten_onto_white(&other.to_rgba8()),
        other => other.to_rgb8(),
    };
    (mode, CanonicalImage(rgb))
}

/// Composite RGBA pixels over an opaque white background.
///
/// Each channel becomes `(c·a + 255·(255 − a)) / 255`, rounded to nearest.
pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
