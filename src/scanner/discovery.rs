//! Recursive enumeration of video files under the scan roots.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use reelshelf_common::paths::{catalog_key, has_extension};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::progress::ScanErrorEntry;

/// One enumerated entry, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    File(PathBuf),
    Failed(ScanErrorEntry),
}

/// How a walk ended.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Folders whose walk finished without a folder-level error.
    pub complete_folders: Vec<PathBuf>,
    /// The walk returned before visiting every entry.
    pub stopped_early: bool,
}

/// Walk `folders` depth-first in file-name order, sending every video file
/// and every walk error to `tx`.
///
/// An unreadable entry that looks like a video file is reported as a file
/// error. Any other error (missing root, unreadable directory, symlink loop)
/// is a folder error and keeps that folder out of
/// [`WalkSummary::complete_folders`]. Stops early when `cancel` fires or the
/// receiver goes away.
pub fn walk(
    folders: &[PathBuf],
    extensions: &[String],
    tx: &UnboundedSender<Discovered>,
    enumerated: &Arc<AtomicU32>,
    cancel: &CancellationToken,
) -> WalkSummary {
    let mut summary = WalkSummary::default();

    for folder in folders {
        let mut clean = true;
        debug!(folder = %folder.display(), "Walking folder");

        for entry in WalkDir::new(folder)
            .follow_links(true)
            .sort_by_file_name()
        {
            if cancel.is_cancelled() {
                debug!(folder = %folder.display(), "Walk cancelled");
                summary.stopped_early = true;
                return summary;
            }

            let discovered = match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() || !has_extension(entry.path(), extensions) {
                        continue;
                    }
                    Discovered::File(entry.into_path())
                }
                Err(err) => {
                    let error = err
                        .io_error()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| err.to_string());
                    match err.path() {
                        Some(path)
                            if has_extension(path, extensions) && err.loop_ancestor().is_none() =>
                        {
                            warn!(path = %path.display(), %error, "Unreadable file");
                            Discovered::Failed(ScanErrorEntry::for_file(catalog_key(path), error))
                        }
                        path => {
                            clean = false;
                            let at = path.unwrap_or(folder.as_path());
                            warn!(folder = %at.display(), %error, "Unreadable folder");
                            Discovered::Failed(ScanErrorEntry::for_folder(catalog_key(at), error))
                        }
                    }
                }
            };

            if matches!(discovered, Discovered::File(_))
                || matches!(&discovered, Discovered::Failed(e) if e.file.is_some())
            {
                enumerated.fetch_add(1, Ordering::SeqCst);
            }
            if tx.send(discovered).is_err() {
                summary.stopped_early = true;
                return summary;
            }
        }

        if clean {
            summary.complete_folders.push(folder.clone());
        }
    }

    summary
}

/// Absolute form of each root, where it can be resolved. Unresolvable roots
/// are kept as given so the walk reports them.
pub fn normalize_roots(folders: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::with_capacity(folders.len());
    for folder in folders {
        let root = std::fs::canonicalize(&folder).unwrap_or(folder);
        if !roots.iter().any(|existing| existing == &root) {
            roots.push(root);
        }
    }
    roots
}
