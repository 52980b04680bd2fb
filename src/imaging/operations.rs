//! High-level compression operations.
//!
//! These functions combine the pure calculations with backend execution:
//! [`normalize`] loads a source, [`reencode`] writes it back at high quality,
//! [`fit_to_budget`] searches quality and then resolution until the output
//! fits, and [`compress_image`] picks between the two by size class.
//!
//! ## Temp files
//!
//! Every encode attempt goes into its own [`NamedTempFile`] in the output
//! directory, named `.<stem>.<random>.tmp.jpg`. A passing attempt is
//! persisted onto the final `.jpg` path with an atomic rename; every other
//! attempt is deleted when its handle drops, including on error paths. The
//! random part keeps concurrent workers from ever sharing a temp file.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{classify, prescale_dimensions, quality_schedule, shrink_dimensions};
use super::normalize::CanonicalImage;
use super::params::{EncodeParams, FALLBACK_QUALITY, MIN_DIMENSION, Quality, REENCODE_QUALITY};
use crate::naming::jpeg_output_path;
use crate::types::{CompressionTarget, SizeClass, SourceImage};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Input not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error(transparent)]
    Decode(BackendError),
    #[error(
        "Cannot fit into {target} bytes without shrinking below {min}px \
         (last tried {width}x{height})",
        min = MIN_DIMENSION
    )]
    BudgetUnreachable { target: u64, width: u32, height: u32 },
    #[error("Failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
    #[error("Output {} is already claimed by {}", .output.display(), .claimed_by.display())]
    StemCollision { output: PathBuf, claimed_by: PathBuf },
}

impl CompressError {
    fn write(path: &Path, err: impl std::fmt::Display) -> Self {
        CompressError::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Result type for compression operations.
pub type Result<T> = std::result::Result<T, CompressError>;

/// A JPEG that was written to its final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub path: PathBuf,
    pub params: EncodeParams,
    /// Size of the written file.
    pub bytes: u64,
}

/// Outcome of [`compress_image`] for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub source: SourceImage,
    pub class: SizeClass,
    pub encoded: Encoded,
}

/// Measure a source file and decode it into canonical RGB.
///
/// The byte size comes from the filesystem, before any decoding.
pub fn normalize(
    backend: &impl ImageBackend,
    path: &Path,
) -> Result<(SourceImage, CanonicalImage)> {
    let original_size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CompressError::InputMissing(path.to_path_buf()));
        }
        Err(e) => return Err(CompressError::Decode(BackendError::Io(e))),
    };

    let decoded = backend.decode(path).map_err(|e| match e {
        BackendError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            CompressError::InputMissing(path.to_path_buf())
        }
        other => CompressError::Decode(other),
    })?;

    let (width, height) = decoded.image.dimensions();
    let source = SourceImage {
        path: path.to_path_buf(),
        original_size,
        width,
        height,
        color_mode: decoded.color_mode,
    };
    Ok((source, decoded.image))
}

/// Write `image` as a quality-95 JPEG at `output` (extension forced to `.jpg`).
///
/// Dimensions are unchanged and the result is not checked against any budget.
pub fn reencode(
    backend: &impl ImageBackend,
    image: &CanonicalImage,
    output: &Path,
) -> Result<Encoded> {
    let output = jpeg_output_path(output);
    let dir = prepare_output_dir(&output)?;
    let attempt = encode_attempt(backend, image, REENCODE_QUALITY, &dir, &output)?;
    let params = attempt.params;
    let bytes = attempt.bytes;
    attempt.persist(&output)?;
    Ok(Encoded {
        path: output,
        params,
        bytes,
    })
}

/// Fit `image` into `target_size` bytes and write it to `output` as `.jpg`.
///
/// 1. Pre-scale by `sqrt(target / original)` (Lanczos3).
/// 2. Try qualities `initial, initial − 5, …` while quality stays above 10.
/// 3. Shrink both sides by 0.9 per step at quality 50 until the output fits,
///    failing with [`CompressError::BudgetUnreachable`] before either side
///    drops below 100px.
///
/// The first attempt whose size is `<= target_size` wins.
pub fn fit_to_budget(
    backend: &impl ImageBackend,
    image: &CanonicalImage,
    original_size: u64,
    target_size: u64,
    initial_quality: Quality,
    output: &Path,
) -> Result<Encoded> {
    let output = jpeg_output_path(output);
    let dir = prepare_output_dir(&output)?;

    let (width, height) = prescale_dimensions(image.dimensions(), original_size, target_size);
    log::debug!(
        "{}: pre-scaling {}x{} -> {}x{}",
        output.display(),
        image.width(),
        image.height(),
        width,
        height
    );
    let prescaled = backend.resize(image, width, height);

    for quality in quality_schedule(initial_quality) {
        let attempt = encode_attempt(backend, &prescaled, quality, &dir, &output)?;
        if let Some(encoded) = attempt.accept_if_fits(target_size, &output)? {
            return Ok(encoded);
        }
    }

    let mut dims = (width, height);
    while let Some(next) = shrink_dimensions(dims) {
        dims = next;
        let shrunk = backend.resize(&prescaled, dims.0, dims.1);
        let attempt = encode_attempt(backend, &shrunk, FALLBACK_QUALITY, &dir, &output)?;
        if let Some(encoded) = attempt.accept_if_fits(target_size, &output)? {
            return Ok(encoded);
        }
    }

    Err(CompressError::BudgetUnreachable {
        target: target_size,
        width: dims.0,
        height: dims.1,
    })
}

/// Compress one file: measure, decode, classify, then re-encode or fit.
///
/// This is the single-image entry point; the batch driver calls it once
/// per file.
pub fn compress_image(
    backend: &impl ImageBackend,
    input: &Path,
    output: &Path,
    target: &CompressionTarget,
) -> Result<Compressed> {
    let (source, image) = normalize(backend, input)?;
    let class = classify(
        source.original_size,
        target.min_size_bytes,
        target.max_size_bytes,
    );
    log::info!(
        "{}: {} bytes, {}x{} {:?}, class {}",
        input.display(),
        source.original_size,
        source.width,
        source.height,
        source.color_mode,
        class
    );

    let encoded = match class {
        SizeClass::Small | SizeClass::Normal => reencode(backend, &image, output)?,
        SizeClass::Large => fit_to_budget(
            backend,
            &image,
            source.original_size,
            target.target_size_bytes,
            target.initial_quality,
            output,
        )?,
    };

    Ok(Compressed {
        source,
        class,
        encoded,
    })
}

/// One encoded attempt still sitting in its temp file.
struct Attempt {
    temp: NamedTempFile,
    params: EncodeParams,
    bytes: u64,
}

impl Attempt {
    /// Rename the temp file onto `output`.
    fn persist(self, output: &Path) -> Result<()> {
        self.temp
            .persist(output)
            .map_err(|e| CompressError::write(output, e.error))?;
        Ok(())
    }

    /// Persist and return the result if it fits; otherwise drop (delete) it.
    fn accept_if_fits(self, target_size: u64, output: &Path) -> Result<Option<Encoded>> {
        let EncodeParams {
            width,
            height,
            quality,
        } = self.params;
        if self.bytes > target_size {
            log::debug!(
                "{}: {}x{} q{} -> {} bytes, over {}",
                output.display(),
                width,
                height,
                quality.value(),
                self.bytes,
                target_size
            );
            return Ok(None);
        }
        log::debug!(
            "{}: {}x{} q{} -> {} bytes, fits",
            output.display(),
            width,
            height,
            quality.value(),
            self.bytes
        );
        let params = self.params;
        let bytes = self.bytes;
        self.persist(output)?;
        Ok(Some(Encoded {
            path: output.to_path_buf(),
            params,
            bytes,
        }))
    }
}

/// Encode into a fresh temp file beside `output` and measure it on disk.
fn encode_attempt(
    backend: &impl ImageBackend,
    image: &CanonicalImage,
    quality: Quality,
    dir: &Path,
    output: &Path,
) -> Result<Attempt> {
    let mut temp = temp_file_for(dir, output)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        backend
            .encode_jpeg(image, quality, &mut writer)
            .map_err(|e| CompressError::write(output, e))?;
        writer
            .flush()
            .map_err(|e| CompressError::write(output, e))?;
    }
    let bytes = temp
        .as_file()
        .metadata()
        .map_err(|e| CompressError::write(output, e))?
        .len();

    let (width, height) = image.dimensions();
    Ok(Attempt {
        temp,
        params: EncodeParams {
            width,
            height,
            quality,
        },
        bytes,
    })
}

fn temp_file_for(dir: &Path, output: &Path) -> Result<NamedTempFile> {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!(".{stem}.");
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".tmp.jpg");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Final outputs are renamed temp files; give them regular file permissions.
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    builder
        .tempfile_in(dir)
        .map_err(|e| CompressError::write(output, e))
}

/// Create the output's parent directory and return it.
fn prepare_output_dir(output: &Path) -> Result<PathBuf> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| CompressError::write(&dir, e))?;
    Ok(dir)
}
