//! Multi-file ingest: globs and upload directories.
//!
//! Files are ingested one after another, in sorted path order, into the same
//! store. A later file therefore wins over an earlier one for any identifier
//! they share. Each file still gets its own [`IngestErrorReport`].
//!
//! ```no_run
//! use rollcall::ingest::{CancellationToken, IngestConfig};
//! use rollcall::intake::drain_dir;
//! use rollcall::store::ShardedStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = ShardedStore::new();
//! for file in drain_dir("uploads", &store, &IngestConfig::default(), &CancellationToken::new())? {
//!     println!("{}: {} errors, removed={}", file.path.display(), file.report.len(), file.removed);
//! }
//! # Ok(())
//! # }
//! ```

use crate::ingest::{CancellationToken, IngestConfig, IngestErrorReport, Ingestor, RunOutcome};
use crate::store::RecordStore;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Outcome of ingesting one file of a batch.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub report: IngestErrorReport,
    /// Whether the file was deleted after ingest (only [`drain_dir`] deletes).
    pub removed: bool,
}

/// Expand a glob pattern into a sorted list of matching files.
///
/// Directories are skipped. No match is an empty list, not an error.
///
/// # Errors
/// Returns an error if the pattern is invalid or a matched path cannot be
/// read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut files = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Ingest `paths` in order with `ingestor`.
///
/// The ingestor's own cancellation token stops the file in progress and
/// skips the rest; files not reached get no report.
pub fn ingest_paths<S: RecordStore + ?Sized>(
    ingestor: &Ingestor<'_, S>,
    paths: &[PathBuf],
) -> Vec<FileReport> {
    let cancel = ingestor.cancellation();
    let mut reports = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(skipped = paths.len() - i, "intake cancelled");
            break;
        }
        let report = ingestor.run(path);
        reports.push(FileReport {
            path: path.clone(),
            report,
            removed: false,
        });
    }
    reports
}

/// Ingest every file matching `pattern` into `store`.
///
/// # Errors
/// Returns an error if the pattern is invalid. Per-file failures, including
/// files that cannot be opened, are in the returned reports.
pub fn ingest_glob<S: RecordStore + ?Sized>(
    pattern: &str,
    store: &S,
    config: &IngestConfig,
    cancel: &CancellationToken,
) -> Result<Vec<FileReport>> {
    let files = expand_glob(pattern)?;
    tracing::debug!(pattern, files = files.len(), "expanded ingest pattern");
    let ingestor = Ingestor::new(store)
        .with_config(config.clone())
        .with_cancellation(cancel.clone());
    Ok(ingest_paths(&ingestor, &files))
}

/// Ingest every file directly inside `dir`, deleting each one that was read
/// to the end.
///
/// A file is kept unless its run read it to the end, so a later drain picks
/// up files that were cancelled, timed out, or could not be read in full. A file that cannot be
/// deleted is logged and reported with `removed == false`.
///
/// # Errors
/// Returns an error if `dir` is not a readable directory.
pub fn drain_dir<S: RecordStore + ?Sized>(
    dir: impl AsRef<Path>,
    store: &S,
    config: &IngestConfig,
    cancel: &CancellationToken,
) -> Result<Vec<FileReport>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("upload directory {} does not exist", dir.display());
    }
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*");
    let mut reports = ingest_glob(&pattern.to_string_lossy(), store, config, cancel)?;

    for file in &mut reports {
        if file.report.outcome() != RunOutcome::Completed || file.report.has_file_error() {
            continue;
        }
        match std::fs::remove_file(&file.path) {
            Ok(()) => file.removed = true,
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = %err, "cannot remove ingested file");
            }
        }
    }
    Ok(reports)
}
