//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Batch progress
//!
//! ```text
//! Compressing 3 images: photos → photos/compressed
//! 001 IMG_001.png → IMG_001.jpg (small, 640x480, q95, 118.2 KiB)
//! 002 IMG_002.jpg → IMG_002.jpg (large, 657x657, q80, 583.9 KiB)
//! 003 broken.jpg ✗ Failed to decode photos/broken.jpg: ...
//! ```
//!
//! ## Batch summary
//!
//! ```text
//! Processed 2 images, 1 failed
//! Failed:
//!     photos/broken.jpg
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::imaging::Compressed;
use crate::process::{BatchReport, CompressionResult, FileResult, ProcessEvent};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// File name of a path, or the whole path if it has none.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count in KiB, matching how thresholds are configured.
fn format_kib(bytes: u64) -> String {
    format!("{:.1} KiB", bytes as f64 / 1024.0)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// One line per file: index, source name, then either the output or the reason.
///
/// ```text
/// 002 IMG_002.jpg → IMG_002.jpg (large, 657x657, q80, 583.9 KiB)
/// 003 broken.jpg ✗ mock decode failure
/// ```
fn result_line(index: usize, result: &FileResult) -> String {
    let source = file_name(&result.source);
    match &result.outcome {
        CompressionResult::Success {
            output,
            class,
            width,
            height,
            quality,
            bytes,
        } => format!(
            "{} {} \u{2192} {} ({}, {}x{}, q{}, {})",
            format_index(index),
            source,
            file_name(output),
            class,
            width,
            height,
            quality,
            format_kib(*bytes)
        ),
        CompressionResult::Failure { reason } => {
            format!("{} {} \u{2717} {}", format_index(index), source, reason)
        }
    }
}

/// Format a single batch progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted {
            input_dir,
            output_dir,
            file_count,
        } => vec![format!(
            "Compressing {}: {} \u{2192} {}",
            plural(*file_count, "image"),
            input_dir.display(),
            output_dir.display()
        )],
        ProcessEvent::FileFinished { index, result } => vec![result_line(*index, result)],
    }
}

/// Print a progress event to stdout.
pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

/// Format the end-of-run summary: counts, then every failed source path.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.results.is_empty() {
        lines.push(format!(
            "No images found in {}",
            report.input_dir.display()
        ));
        return lines;
    }

    lines.push(format!(
        "Processed {}, {} failed",
        plural(report.succeeded, "image"),
        report.failed
    ));
    let failed = report.failed_paths();
    if !failed.is_empty() {
        lines.push("Failed:".to_string());
        for path in failed {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }
    lines
}

/// Print the batch summary to stdout.
pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

/// Format the result of a single-file run.
///
/// ```text
/// IMG_002.jpg → out/IMG_002.jpg
///     Source: 1200x1200, 1953.1 KiB (large)
///     Output: 657x657, q80, 583.9 KiB
/// ```
pub fn format_compressed(compressed: &Compressed) -> Vec<String> {
    let source = &compressed.source;
    let encoded = &compressed.encoded;
    vec![
        format!(
            "{} \u{2192} {}",
            file_name(&source.path),
            encoded.path.display()
        ),
        format!(
            "{}Source: {}x{}, {} ({})",
            indent(1),
            source.width,
            source.height,
            format_kib(source.original_size),
            compressed.class
        ),
        format!(
            "{}Output: {}x{}, q{}, {}",
            indent(1),
            encoded.params.width,
            encoded.params.height,
            encoded.params.quality.value(),
            format_kib(encoded.bytes)
        ),
    ]
}

/// Print the result of a single-file run to stdout.
pub fn print_compressed(compressed: &Compressed) {
    for line in format_compressed(compressed) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
