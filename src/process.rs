//! Batch driver: compress every image in a directory.
//!
//! Takes the direct children of an input directory, keeps the regular files
//! with an accepted extension, and runs each one through
//! [`compress_image`]. A failing file becomes a [`CompressionResult::Failure`]
//! entry in the [`BatchReport`]; it never aborts the batch.
//!
//! ## Output Structure
//!
//! ```text
//! photos/
//! ├── IMG_001.png          # 300 KiB   → re-encoded at quality 95
//! ├── IMG_002.jpg          # 2 MiB     → fitted into 600 KiB
//! ├── notes.txt            # ignored
//! ├── raw/                 # ignored (not recursive)
//! └── compressed/
//!     ├── IMG_001.jpg
//!     └── IMG_002.jpg
//! ```
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon) on
//! whatever pool is current (see `init_thread_pool` in the binary). Results
//! are collected in enumeration order, which is sorted by file name, so the
//! report does not depend on which worker finishes first.

use crate::imaging::{CompressError, Compressed, ImageBackend, RustBackend, compress_image};
use crate::naming::{PlannedOutput, is_supported_image, plan_outputs};
use crate::types::{CompressionTarget, SizeClass};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input directory not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("Failed to list {}: {message}", .path.display())]
    Walk { path: PathBuf, message: String },
}

/// Outcome for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressionResult {
    Success {
        output: PathBuf,
        class: SizeClass,
        width: u32,
        height: u32,
        quality: u32,
        bytes: u64,
    },
    Failure {
        reason: String,
    },
}

impl CompressionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompressionResult::Success { .. })
    }
}

impl From<Compressed> for CompressionResult {
    fn from(c: Compressed) -> Self {
        CompressionResult::Success {
            output: c.encoded.path,
            class: c.class,
            width: c.encoded.params.width,
            height: c.encoded.params.height,
            quality: c.encoded.params.quality.value(),
            bytes: c.encoded.bytes,
        }
    }
}

impl From<CompressError> for CompressionResult {
    fn from(e: CompressError) -> Self {
        CompressionResult::Failure {
            reason: e.to_string(),
        }
    }
}

/// A source file paired with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: CompressionResult,
}

/// Summary of a batch run, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<FileResult>,
}

impl BatchReport {
    fn new(input_dir: &Path, output_dir: &Path, results: Vec<FileResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Source paths of the files that failed.
    pub fn failed_paths(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.source.as_path())
            .collect()
    }

    /// Paths of the JPEGs that were written.
    pub fn produced_paths(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                CompressionResult::Success { output, .. } => Some(output.as_path()),
                CompressionResult::Failure { .. } => None,
            })
            .collect()
    }

    /// Write the report as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), ProcessError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        input_dir: PathBuf,
        output_dir: PathBuf,
        file_count: usize,
    },
    /// `index` is the 1-based position in enumeration order.
    FileFinished { index: usize, result: FileResult },
}

/// Regular files directly inside `input_dir` with an accepted extension,
/// sorted by file name.
///
/// Symlinks to regular files count; dangling links and links to
/// directories are skipped.
pub fn discover_images(input_dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if !input_dir.is_dir() {
        return Err(ProcessError::InputMissing(input_dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ProcessError::Walk {
            path: input_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        // `Path::is_file` follows symlinks, `entry.file_type()` does not.
        if entry.path().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// Compress every image in `input_dir` into `output_dir` with the pure Rust backend.
pub fn run(
    input_dir: &Path,
    output_dir: &Path,
    target: &CompressionTarget,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    run_with_backend(&RustBackend::new(), input_dir, output_dir, target, progress)
}

/// Run a batch using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    input_dir: &Path,
    output_dir: &Path,
    target: &CompressionTarget,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let inputs = discover_images(input_dir)?;
    std::fs::create_dir_all(output_dir)?;
    let plan = plan_outputs(&inputs, output_dir);
    log::info!(
        "{}: {} image(s) -> {}",
        input_dir.display(),
        inputs.len(),
        output_dir.display()
    );

    if let Some(tx) = &progress {
        tx.send(ProcessEvent::BatchStarted {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            file_count: inputs.len(),
        })
        .ok();
    }

    let results: Vec<FileResult> = inputs
        .par_iter()
        .zip(plan.par_iter())
        .enumerate()
        .map(|(i, (input, planned))| {
            let outcome = match planned {
                PlannedOutput::Write(output) => compress_image(backend, input, output, target),
                PlannedOutput::Collision { output, claimed_by } => {
                    Err(CompressError::StemCollision {
                        output: output.clone(),
                        claimed_by: claimed_by.clone(),
                    })
                }
            };
            let outcome = match outcome {
                Ok(compressed) => CompressionResult::from(compressed),
                Err(e) => {
                    log::warn!("{}: {}", input.display(), e);
                    CompressionResult::from(e)
                }
            };
            let result = FileResult {
                source: input.clone(),
                outcome,
            };
            if let Some(tx) = &progress {
                tx.send(ProcessEvent::FileFinished {
                    index: i + 1,
                    result: result.clone(),
                })
                .ok();
            }
            result
        })
        .collect();

    Ok(BatchReport::new(input_dir, output_dir, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, pixel_count};
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    /// Size of the placeholder source files written by the tests.
    fn write_source(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    fn small_target() -> CompressionTarget {
        // 1 KiB / 2 KiB thresholds so placeholder sources stay tiny.
        CompressionTarget::from_kb(1, 2, 85)
    }

    fn dense(w: u32, h: u32, _q: u32) -> u64 {
        (w as u64 * h as u64) / 100
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discover_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.png", "a.JPG", "b.webp", "notes.txt", "d.gif", "e.tiff"] {
            write_source(tmp.path(), name, 10);
        }
        fs::create_dir(tmp.path().join("nested")).unwrap();
        write_source(&tmp.path().join("nested"), "deep.jpg", 10);
        fs::create_dir(tmp.path().join("folder.jpg")).unwrap();

        let found: Vec<String> = discover_images(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(found, vec!["a.JPG", "b.webp", "c.png", "e.tiff"]);
    }

    #[cfg(unix)]
    #[test]
    fn discover_follows_symlinked_images() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = write_source(elsewhere.path(), "real.png", 10);
        std::os::unix::fs::symlink(&target, tmp.path().join("linked.png")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.jpg"), tmp.path().join("dangling.jpg"))
            .unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), tmp.path().join("dir.jpg")).unwrap();

        let found = discover_images(tmp.path()).unwrap();

        assert_eq!(found, vec![tmp.path().join("linked.png")]);
    }

    #[test]
    fn discover_missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let result = discover_images(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ProcessError::InputMissing(_))));
    }

    #[test]
    fn discover_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_images(tmp.path()).unwrap().is_empty());
    }

    // =========================================================================
    // Batch runs with the mock backend
    // =========================================================================

    #[test]
    fn corrupt_file_does_not_abort_batch() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        let corrupt = write_source(tmp.path(), "bad.jpg", 10);
        write_source(tmp.path(), "big.png", 16 * 1024);
        let backend = MockBackend::new((1200, 1200), dense).failing_on("bad.jpg");

        let report = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_paths(), vec![corrupt.as_path()]);
        assert_eq!(report.produced_paths(), vec![out.join("big.jpg").as_path()]);
        match &report.results[1].outcome {
            CompressionResult::Success { class, bytes, .. } => {
                assert_eq!(*class, SizeClass::Large);
                assert!(*bytes <= 2 * 1024);
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(out.join("big.jpg").exists());
        assert!(!out.join("bad.jpg").exists());
    }

    #[test]
    fn small_and_normal_files_are_reencoded() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        write_source(tmp.path(), "normal.jpg", 1536);
        write_source(tmp.path(), "small.png", 100);
        let backend = MockBackend::new((50, 40), pixel_count);

        let report = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        assert_eq!(report.succeeded, 2);
        let classes: Vec<SizeClass> = report
            .results
            .iter()
            .map(|r| match &r.outcome {
                CompressionResult::Success {
                    class,
                    quality,
                    width,
                    height,
                    ..
                } => {
                    assert_eq!(*quality, 95);
                    assert_eq!((*width, *height), (50, 40));
                    *class
                }
                other => panic!("expected success, got {other:?}"),
            })
            .collect();
        assert_eq!(classes, vec![SizeClass::Normal, SizeClass::Small]);
    }

    #[test]
    fn stem_collision_fails_later_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        let first = write_source(tmp.path(), "cover.jpg", 10);
        let second = write_source(tmp.path(), "cover.png", 10);
        let backend = MockBackend::new((20, 20), pixel_count);

        let report = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed_paths(), vec![second.as_path()]);
        match &report.results[1].outcome {
            CompressionResult::Failure { reason } => {
                assert!(reason.contains("already claimed"), "{reason}");
                assert!(reason.contains(&first.display().to_string()), "{reason}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        // The colliding file is never decoded.
        let decodes: Vec<RecordedOp> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Decode(_)))
            .collect();
        assert_eq!(decodes, vec![RecordedOp::Decode("cover.jpg".into())]);
    }

    #[test]
    fn results_follow_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        for name in ["d.jpg", "b.jpg", "a.jpg", "c.jpg"] {
            write_source(tmp.path(), name, 10);
        }
        let backend = MockBackend::new((20, 20), pixel_count);

        let report = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        let sources: Vec<_> = report
            .results
            .iter()
            .map(|r| r.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(sources, vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
    }

    #[test]
    fn output_dir_inside_input_is_not_processed() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        write_source(tmp.path(), "a.jpg", 10);
        let backend = MockBackend::new((20, 20), pixel_count);

        run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();
        let rerun = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        assert_eq!(rerun.results.len(), 1);
        assert_eq!(rerun.succeeded, 1);
        assert!(out.join("a.jpg").exists());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        write_source(tmp.path(), "big.png", 16 * 1024);
        write_source(tmp.path(), "small.jpg", 10);
        let backend = MockBackend::new((1200, 1200), dense);

        run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["big.jpg", "small.jpg"]);
    }

    #[test]
    fn empty_batch_still_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        write_source(tmp.path(), "notes.txt", 10);
        let backend = MockBackend::new((20, 20), pixel_count);

        let report = run_with_backend(&backend, tmp.path(), &out, &small_target(), None).unwrap();

        assert!(report.results.is_empty());
        assert!(out.is_dir());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn missing_input_directory_aborts() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new((20, 20), pixel_count);
        let result = run_with_backend(
            &backend,
            &tmp.path().join("missing"),
            &tmp.path().join("out"),
            &small_target(),
            None,
        );
        assert!(matches!(result, Err(ProcessError::InputMissing(_))));
    }

    #[test]
    fn progress_events_cover_every_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("compressed");
        write_source(tmp.path(), "a.jpg", 10);
        write_source(tmp.path(), "b.jpg", 10);
        let backend = MockBackend::new((20, 20), pixel_count);
        let (tx, rx) = mpsc::channel();

        run_with_backend(&backend, tmp.path(), &out, &small_target(), Some(tx)).unwrap();

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert!(matches!(
            events[0],
            ProcessEvent::BatchStarted { file_count: 2, .. }
        ));
        let mut indices: Vec<usize> = events[1..]
            .iter()
            .map(|e| match e {
                ProcessEvent::FileFinished { index, .. } => *index,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        indices.sort();
        assert_eq!(indices, vec![1, 2]);
    }

    // =========================================================================
    // Report serialization
    // =========================================================================

    #[test]
    fn report_json_shape() {
        let report = BatchReport::new(
            Path::new("/in"),
            Path::new("/in/compressed"),
            vec![
                FileResult {
                    source: "/in/a.png".into(),
                    outcome: CompressionResult::Success {
                        output: "/in/compressed/a.jpg".into(),
                        class: SizeClass::Large,
                        width: 657,
                        height: 657,
                        quality: 80,
                        bytes: 600_000,
                    },
                },
                FileResult {
                    source: "/in/b.jpg".into(),
                    outcome: CompressionResult::Failure {
                        reason: "broken".into(),
                    },
                },
            ],
        );

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["results"][0]["status"], "success");
        assert_eq!(json["results"][0]["class"], "large");
        assert_eq!(json["results"][0]["source"], "/in/a.png");
        assert_eq!(json["results"][1]["status"], "failure");
        assert_eq!(json["results"][1]["reason"], "broken");
    }

    #[test]
    fn save_json_round_trips() {
        let tmp = TempDir::new().unwrap();
        let report = BatchReport::new(Path::new("/in"), Path::new("/out"), Vec::new());
        let path = tmp.path().join("reports/run.json");

        report.save_json(&path).unwrap();

        let loaded: BatchReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
