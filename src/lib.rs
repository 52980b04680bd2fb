//! # jpegfit
//!
//! Normalize a folder of images into JPEGs that fit a byte budget.
//!
//! Every accepted image in the input directory is written to the output
//! directory as `<stem>.jpg`. What happens on the way depends on how big the
//! source file is:
//!
//! ```text
//! size <  min_kb          small   → re-encode at quality 95, same dimensions
//! min_kb ≤ size ≤ max_kb  normal  → re-encode at quality 95, same dimensions
//! size >  max_kb          large   → scale + quality search until ≤ max_kb
//! ```
//!
//! Transparent sources are composited onto white, since JPEG has no alpha.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, classify, re-encode and budget fitting behind the [`imaging::ImageBackend`] trait |
//! | [`process`] | Batch driver: directory enumeration, parallel dispatch, [`process::BatchReport`] |
//! | [`naming`] | Accepted extensions and `<stem>.jpg` output planning with collision detection |
//! | [`config`] | Layered `jpegfit.toml` loading, validation and CLI overrides |
//! | [`types`] | Shared data types (`SourceImage`, `SizeClass`, `CompressionTarget`) |
//! | [`output`] | CLI output formatting for progress and summaries |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and Lanczos3 resampling come from the [`image`] crate. JPEGs are
//! written by `jpeg_encoder` with optimized Huffman tables, so every attempt
//! in the budget search is as small as its quality allows. The binary has no
//! system library dependencies, and the backend trait keeps the search loops
//! testable against a mock that writes predictable byte counts.
//!
//! ## Fail Per File, Not Per Batch
//!
//! A file that cannot be decoded or cannot be fitted becomes a failure entry
//! in the report. Only a missing input directory aborts a run.
//!
//! ## Temp Files
//!
//! Each encode attempt goes to its own uniquely named temp file next to the
//! output. Accepted attempts are renamed into place, so a reader never sees a
//! half-written `.jpg`, and rejected attempts are removed on drop.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod types;
