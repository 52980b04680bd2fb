//! Centralized file naming for inputs and outputs.
//!
//! Inputs are selected by extension (case-insensitive) against the decoders
//! compiled into [`RustBackend`](crate::imaging::RustBackend). Every output
//! is named after its input's stem with a `.jpg` extension:
//!
//! ```text
//! photos/IMG_001.PNG   →  photos/compressed/IMG_001.jpg
//! photos/cover.webp    →  photos/compressed/cover.jpg
//! ```
//!
//! ## Stem collisions
//!
//! `cover.png` and `cover.webp` both map to `cover.jpg`. Instead of letting
//! the later file silently overwrite the earlier one, [`plan_outputs`] gives
//! the name to the first input (in sorted order) and marks every later one
//! as a collision naming the winner.

use crate::imaging::supported_input_extensions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Whether `path` has one of the accepted image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// `path` with its extension replaced by `.jpg`.
pub fn jpeg_output_path(path: &Path) -> PathBuf {
    path.with_extension("jpg")
}

/// Output path in `output_dir` for the given input file.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    jpeg_output_path(&output_dir.join(stem))
}

/// Where one input is going to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOutput {
    /// The input owns this output path.
    Write(PathBuf),
    /// An earlier input already owns the output path.
    Collision { output: PathBuf, claimed_by: PathBuf },
}

/// Assign an output path to every input, first come first served.
///
/// The result has one entry per input, in input order.
pub fn plan_outputs(inputs: &[PathBuf], output_dir: &Path) -> Vec<PlannedOutput> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let output = output_path_for(input, output_dir);
            match claimed.get(&output) {
                Some(owner) => PlannedOutput::Collision {
                    output,
                    claimed_by: (*owner).clone(),
                },
                None => {
                    claimed.insert(output.clone(), input);
                    PlannedOutput::Write(output)
                }
            }
        })
        .collect()
}
