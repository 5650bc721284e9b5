use crate::constants::REPLACE_ROOT_PREFIX;
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::processing::{CompressionOutcome, CompressionRequest, Compressor};
use crate::staging::move_into_place;
use crate::utils::{compression_ratio, create_progress_bar, format_file_size};
use crate::validation::validate_input_dir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where compressed files end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Mirror the input tree under `output_root`
    Copy { output_root: PathBuf },
    /// Overwrite each original once its compressed version is complete
    Replace,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_root: PathBuf,
    pub mode: OutputMode,
    /// Worker count; 1 runs sequentially, 0 uses one worker per CPU
    pub jobs: usize,
    pub show_progress: bool,
}

impl BatchOptions {
    pub fn new(input_root: PathBuf, mode: OutputMode) -> Self {
        Self {
            input_root,
            mode,
            jobs: 1,
            show_progress: false,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// An image found under the input root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImage {
    pub path: PathBuf,
    /// Path relative to the input root
    pub relative: PathBuf,
    pub kind: ImageKind,
}

#[derive(Debug, Default)]
pub struct TreeScan {
    pub images: Vec<DiscoveredImage>,
    /// Regular files that are not PNG or JPEG
    pub skipped: usize,
}

/// Totals for one pass over a tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub images: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub passthrough: usize,
    pub skipped: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn from_outcomes(outcomes: &[CompressionOutcome], skipped: usize, elapsed: Duration) -> Self {
        let mut summary = BatchSummary {
            images: outcomes.len(),
            skipped,
            elapsed,
            ..Default::default()
        };
        for outcome in outcomes {
            if outcome.success {
                summary.succeeded += 1;
                summary.bytes_in += outcome.bytes_in;
                summary.bytes_out += outcome.bytes_out;
                if outcome.passthrough {
                    summary.passthrough += 1;
                }
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    /// Overall `1 - out/in` across successfully compressed files
    pub fn compression_ratio(&self) -> Option<f64> {
        compression_ratio(self.bytes_in, self.bytes_out)
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<CompressionOutcome>,
    pub summary: BatchSummary,
}

/// Recursively enumerate PNG and JPEG files under `root`.
///
/// Symlinks are not followed. `exclude` prunes one directory (and everything
/// below it) from the walk. Unreadable entries are logged and skipped.
pub fn collect_image_files(root: &Path, exclude: Option<&Path>) -> Result<TreeScan> {
    validate_input_dir(root)?;

    let mut scan = TreeScan::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |ex| e.path() != ex));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match ImageKind::from_path(path) {
            Some(kind) => {
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                scan.images.push(DiscoveredImage {
                    path: path.to_path_buf(),
                    relative,
                    kind,
                });
            }
            None => {
                debug!(path = %path.display(), "Skipping non-image file");
                scan.skipped += 1;
            }
        }
    }

    Ok(scan)
}

/// Mirror `relative` under `root`
pub fn generate_output_path(root: &Path, relative: &Path) -> PathBuf {
    root.join(relative)
}

pub fn resolve_jobs(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

/// Compress every PNG and JPEG under the input root.
///
/// Per-file failures are logged and counted in the summary; only problems
/// with the input root or output root abort the pass. In replace mode a file
/// is overwritten only after its compressed version is complete, so a failed
/// file keeps its original bytes.
pub fn process_directory(compressor: &Compressor, options: &BatchOptions) -> Result<BatchReport> {
    let started = Instant::now();
    let input_root = &options.input_root;
    validate_input_dir(input_root)?;

    // Replace mode stages every result under a process-private root mirroring the input tree.
    let (destination_root, replace_root) = match &options.mode {
        OutputMode::Copy { output_root } => {
            if same_directory(input_root, output_root) {
                return Err(CompressionError::OutputIsInput(output_root.clone()));
            }
            fs::create_dir_all(output_root)
                .map_err(|_| CompressionError::DirectoryCreationFailed(output_root.clone()))?;
            (output_root.clone(), None)
        }
        OutputMode::Replace => {
            let dir = create_replace_root(compressor.config().staging_root.as_deref())?;
            (dir.path().to_path_buf(), Some(dir))
        }
    };

    let exclude = match &options.mode {
        OutputMode::Copy { output_root } => nested_output_root(input_root, output_root),
        OutputMode::Replace => None,
    };
    let scan = collect_image_files(input_root, exclude.as_deref())?;

    info!(
        images = scan.images.len(),
        skipped = scan.skipped,
        "📊 Found {} image files to process",
        scan.images.len()
    );

    let progress = create_progress_bar(scan.images.len() as u64, options.show_progress);
    let process = |image: &DiscoveredImage| {
        let outcome = process_image(compressor, image, &destination_root, replace_root.is_some());
        progress.inc(1);
        outcome
    };

    let jobs = resolve_jobs(options.jobs).min(scan.images.len().max(1));
    let outcomes: Vec<CompressionOutcome> = if jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => {
                debug!(jobs, "Processing in parallel");
                pool.install(|| scan.images.par_iter().map(process).collect())
            }
            Err(e) => {
                warn!(error = %e, "Failed to build worker pool, processing sequentially");
                scan.images.iter().map(process).collect()
            }
        }
    } else {
        scan.images.iter().map(process).collect()
    };
    progress.finish_and_clear();

    if let Some(dir) = replace_root {
        if let Err(e) = dir.close() {
            warn!(error = %e, "Failed to remove replace-mode staging root");
        }
    }

    let summary = BatchSummary::from_outcomes(&outcomes, scan.skipped, started.elapsed());
    info!(
        images = summary.images,
        succeeded = summary.succeeded,
        failed = summary.failed,
        passthrough = summary.passthrough,
        skipped = summary.skipped,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "✅ Compression finished: {} of {} images compressed, {} -> {} ({} saved) in {:.2?}",
        summary.succeeded,
        summary.images,
        format_file_size(summary.bytes_in),
        format_file_size(summary.bytes_out),
        summary
            .compression_ratio()
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "0.0%".to_string()),
        summary.elapsed
    );
    if summary.failed > 0 {
        warn!(failed = summary.failed, "⚠️  {} files could not be compressed", summary.failed);
    }

    Ok(BatchReport { outcomes, summary })
}

fn create_replace_root(staging_root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(REPLACE_ROOT_PREFIX);
    let dir = match staging_root {
        Some(root) => {
            fs::create_dir_all(root)
                .map_err(|_| CompressionError::DirectoryCreationFailed(root.to_path_buf()))?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    Ok(dir)
}

fn process_image(
    compressor: &Compressor,
    image: &DiscoveredImage,
    destination_root: &Path,
    replace: bool,
) -> CompressionOutcome {
    let request = CompressionRequest {
        source_path: image.path.clone(),
        destination_path: generate_output_path(destination_root, &image.relative),
        kind: image.kind,
    };
    let mut outcome = compressor.compress(&request);

    if replace && outcome.success {
        match move_into_place(&request.destination_path, &image.path) {
            Ok(()) => outcome.destination = image.path.clone(),
            Err(e) => {
                warn!(
                    path = %image.path.display(),
                    error = %e,
                    "Failed to replace original, leaving it untouched"
                );
                outcome = CompressionOutcome::failed(&request, outcome.bytes_in, e);
            }
        }
    }

    outcome
}

/// Whether both paths resolve to the same existing directory
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// The output root, when it sits inside the input root and must be pruned
fn nested_output_root(input_root: &Path, output_root: &Path) -> Option<PathBuf> {
    let input = input_root.canonicalize().ok()?;
    let output = output_root.canonicalize().ok()?;
    if output.starts_with(&input) && output != input {
        // Walk paths are built from `input_root` as given, so rebuild the prefix the same way.
        let relative = output.strip_prefix(&input).ok()?;
        Some(input_root.join(relative))
    } else {
        None
    }
}
