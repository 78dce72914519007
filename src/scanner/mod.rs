//! Media library scanner.
//!
//! A scan walks its root folders, parses every video file name, resolves
//! movies and TV shows against the metadata providers and upserts the result
//! into the [`LibraryStore`]. Lookups run a bounded number at a time, but
//! results are written and reported in enumeration order.
//!
//! Only one scan runs at a time. A run ends `completed`, `cancelled` or
//! `failed`; only a catalog write failure fails it.

pub mod discovery;
pub mod identifier;
pub mod progress;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{future, Stream, StreamExt};
use parking_lot::Mutex;
use reelshelf_common::paths::{catalog_key, VIDEO_EXTENSIONS};
use reelshelf_common::{Error, ItemId, ScanId, ScanStatus};
use reelshelf_db::models::LibraryItem;
use reelshelf_db::queries::scan_history::ScanTotals;
use reelshelf_parser::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::library::LibraryStore;
use crate::metadata::{MetadataResolver, Resolution};

pub use discovery::Discovered;
pub use identifier::{catalog_item, FileFacts, Identification, MediaIdentifier};
pub use progress::{ScanErrorEntry, ScanEvent, ScanProgress, ScanResults};

/// Why a scan could not start or did not finish.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("a scan is already running")]
    AlreadyScanning,

    #[error("no folders to scan")]
    NoFolders,

    #[error("could not write the catalog; the library may be incomplete and it is safe to retry: {0}")]
    Store(#[from] Error),

    #[error("scan task aborted")]
    Aborted,
}

/// Tunables for a scanner.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Metadata lookups in flight at once.
    pub concurrency: usize,
    /// Drop stale catalog entries after a completed scan.
    pub sweep_missing: bool,
    /// Video file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            sweep_missing: true,
            extensions: VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.scan.lookup_concurrency.max(1),
            sweep_missing: config.scan.sweep_missing,
            extensions: config.library.extensions.clone(),
        }
    }
}

/// Where the scanner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Scanning(ScanId),
}

struct ActiveScan {
    id: ScanId,
    cancel: CancellationToken,
}

struct Inner {
    store: LibraryStore,
    resolver: Arc<MetadataResolver>,
    identifier: MediaIdentifier,
    options: ScanOptions,
    active: Mutex<Option<ActiveScan>>,
}

/// Scanner for discovering and cataloging media files.
///
/// Cheap to clone; clones share the single-scan lock.
#[derive(Clone)]
pub struct LibraryScanner {
    inner: Arc<Inner>,
}

impl LibraryScanner {
    pub fn new(store: LibraryStore, resolver: Arc<MetadataResolver>, options: ScanOptions) -> Self {
        Self::with_parser(store, resolver, options, Parser::default())
    }

    /// A scanner whose file names are parsed by `parser`.
    pub fn with_parser(
        store: LibraryStore,
        resolver: Arc<MetadataResolver>,
        options: ScanOptions,
        parser: Parser,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                resolver,
                identifier: MediaIdentifier::new(parser),
                options,
                active: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ScannerState {
        match self.inner.active.lock().as_ref() {
            Some(active) => ScannerState::Scanning(active.id),
            None => ScannerState::Idle,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state(), ScannerState::Scanning(_))
    }

    /// Start scanning `folders` in the background.
    ///
    /// Fails with [`ScanError::AlreadyScanning`] while another run is in
    /// flight; that run is unaffected.
    pub fn start_scan(&self, folders: Vec<PathBuf>) -> Result<ScanHandle, ScanError> {
        if folders.is_empty() {
            return Err(ScanError::NoFolders);
        }
        let folders = discovery::normalize_roots(folders);

        let mut active = self.inner.active.lock();
        if let Some(running) = active.as_ref() {
            info!(scan_id = %running.id, "Scan requested while one is running");
            return Err(ScanError::AlreadyScanning);
        }

        let record = self.inner.store.begin_scan(&folders)?;
        let cancel = CancellationToken::new();
        *active = Some(ActiveScan {
            id: record.id,
            cancel: cancel.clone(),
        });
        drop(active);

        let (tx, rx) = mpsc::unbounded_channel();
        let inner = self.inner.clone();
        let run_cancel = cancel.clone();
        let scan_id = record.id;
        let task = tokio::spawn(async move {
            let _reset = ActiveReset {
                inner: inner.clone(),
                id: scan_id,
            };
            run(inner, scan_id, folders, run_cancel, tx).await
        });

        Ok(ScanHandle {
            scan_id,
            events: UnboundedReceiverStream::new(rx),
            cancel: cancel.clone(),
            guard: Some(cancel.drop_guard()),
            task,
        })
    }

    /// Scan `folders` to completion, calling `on_progress` after each file.
    pub async fn scan<F>(&self, folders: Vec<PathBuf>, mut on_progress: F) -> Result<ScanResults, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let mut handle = self.start_scan(folders)?;
        while let Some(event) = handle.next_event().await {
            if let ScanEvent::Progress(progress) = &event {
                on_progress(progress);
            }
        }
        handle.finish().await
    }

    /// Ask the running scan to stop after the files already in flight.
    ///
    /// Returns `false` when nothing is running.
    pub fn cancel_scan(&self) -> bool {
        match self.inner.active.lock().as_ref() {
            Some(active) => {
                info!(scan_id = %active.id, "Cancelling scan");
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Re-parse and re-resolve one stored item, keeping its play history.
    ///
    /// When no provider matches, the stored item is returned untouched.
    pub async fn refresh_item(&self, id: ItemId) -> Result<LibraryItem, Error> {
        let store = &self.inner.store;
        let existing = store
            .get(id)?
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let path = PathBuf::from(&existing.file_path);
        let identification = self.inner.identifier.identify_name(&existing.original_filename);
        let facts = match tokio::fs::metadata(&path).await {
            Ok(metadata) => FileFacts::from_metadata(&metadata),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Refreshing item whose file is unreadable");
                FileFacts {
                    size: existing.file_size,
                    modified: existing.last_modified,
                }
            }
        };

        let resolution = self.inner.resolver.resolve(&identification.identity).await;
        if !resolution.is_match() {
            for failure in &resolution.failures {
                warn!(item_id = %id, provider = %failure.provider, error = %failure.error, "Lookup failed during refresh");
            }
            info!(item_id = %id, "No metadata match, keeping stored item");
            return Ok(existing);
        }

        let item = catalog_item(&path, &identification, facts, resolution.result.record());
        store.upsert(&item)?;
        info!(item_id = %id, "Item refreshed");

        store
            .get(id)?
            .ok_or_else(|| Error::not_found(id.to_string()))
    }
}

/// Clears the active-scan slot when the run ends, however it ends.
struct ActiveReset {
    inner: Arc<Inner>,
    id: ScanId,
}

impl Drop for ActiveReset {
    fn drop(&mut self) {
        let mut active = self.inner.active.lock();
        if active.as_ref().is_some_and(|a| a.id == self.id) {
            *active = None;
        }
    }
}

/// A running scan.
///
/// Yields [`ScanEvent`]s as a [`Stream`]. Dropping the handle cancels the
/// scan; [`ScanHandle::finish`] waits for the results instead.
pub struct ScanHandle {
    scan_id: ScanId,
    events: UnboundedReceiverStream<ScanEvent>,
    cancel: CancellationToken,
    guard: Option<DropGuard>,
    task: JoinHandle<Result<ScanResults, ScanError>>,
}

impl fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanHandle")
            .field("scan_id", &self.scan_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ScanHandle {
    pub fn id(&self) -> ScanId {
        self.scan_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.next().await
    }

    /// Wait for the scan to end.
    pub async fn finish(mut self) -> Result<ScanResults, ScanError> {
        if let Some(guard) = self.guard.take() {
            guard.disarm();
        }
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(scan_id = %self.scan_id, error = %err, "Scan task died");
                Err(ScanError::Aborted)
            }
        }
    }
}

impl Stream for ScanHandle {
    type Item = ScanEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}

/// What processing one enumerated entry produced.
enum Outcome {
    Skipped(PathBuf),
    /// `candidate` is set when the failed file's name parses as a movie or
    /// TV show; such files count toward `found`.
    Failed {
        entry: ScanErrorEntry,
        candidate: bool,
    },
    Resolved {
        path: PathBuf,
        identification: Identification,
        facts: FileFacts,
        resolution: Resolution,
    },
}

async fn process(inner: Arc<Inner>, discovered: Discovered) -> Outcome {
    let path = match discovered {
        Discovered::File(path) => path,
        Discovered::Failed(entry) => {
            let candidate = entry
                .file
                .as_deref()
                .is_some_and(|file| inner.identifier.identify(Path::new(file)).is_candidate());
            return Outcome::Failed { entry, candidate };
        }
    };

    let identification = inner.identifier.identify(&path);
    if !identification.is_candidate() {
        debug!(path = %path.display(), "Not a movie or TV show, skipping");
        return Outcome::Skipped(path);
    }

    let facts = match tokio::fs::metadata(&path).await {
        Ok(metadata) => FileFacts::from_metadata(&metadata),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Unreadable file");
            return Outcome::Failed {
                entry: ScanErrorEntry::for_file(catalog_key(&path), err),
                candidate: true,
            };
        }
    };

    let resolution = inner.resolver.resolve(&identification.identity).await;
    Outcome::Resolved {
        path,
        identification,
        facts,
        resolution,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| catalog_key(path))
}

async fn run(
    inner: Arc<Inner>,
    scan_id: ScanId,
    folders: Vec<PathBuf>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ScanEvent>,
) -> Result<ScanResults, ScanError> {
    info!(scan_id = %scan_id, folders = ?folders, "Scan started");
    let _ = events.send(ScanEvent::Started {
        scan_id,
        folders: folders.clone(),
    });

    let enumerated = Arc::new(AtomicU32::new(0));
    let (found_tx, found_rx) = mpsc::unbounded_channel();
    let walker = {
        let folders = folders.clone();
        let extensions = inner.options.extensions.clone();
        let enumerated = enumerated.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            discovery::walk(&folders, &extensions, &found_tx, &enumerated, &cancel)
        })
    };

    let mut results = ScanResults::new(scan_id);
    let mut seen: HashSet<String> = HashSet::new();
    let mut store_error: Option<Error> = None;

    // Set when cancellation cut off entries the walker had already sent.
    let pipeline_cut = Arc::new(AtomicBool::new(false));
    {
        let take_cancel = cancel.clone();
        let cut = pipeline_cut.clone();
        let pipeline_inner = inner.clone();
        let mut outcomes = UnboundedReceiverStream::new(found_rx)
            .take_while(move |_| {
                let stop = take_cancel.is_cancelled();
                if stop {
                    cut.store(true, Ordering::SeqCst);
                }
                future::ready(!stop)
            })
            .map(move |discovered| process(pipeline_inner.clone(), discovered))
            .buffered(inner.options.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            let current_file = match outcome {
                Outcome::Skipped(path) => file_name(&path),
                Outcome::Failed { entry, candidate } => {
                    if candidate {
                        results.found += 1;
                    }
                    let current = entry
                        .file
                        .clone()
                        .or_else(|| entry.folder.clone())
                        .unwrap_or_default();
                    if let Some(file) = &entry.file {
                        seen.insert(file.clone());
                    }
                    results.errors.push(entry.clone());
                    let _ = events.send(ScanEvent::FileFailed(entry));
                    current
                }
                Outcome::Resolved {
                    path,
                    identification,
                    facts,
                    resolution,
                } => {
                    results.found += 1;
                    if !resolution.failures.is_empty() {
                        results.lookup_failures += 1;
                    }
                    let item =
                        catalog_item(&path, &identification, facts, resolution.result.record());
                    seen.insert(item.file_path.clone());
                    if let Err(err) = inner.store.upsert(&item) {
                        error!(scan_id = %scan_id, path = %path.display(), error = %err, "Catalog write failed, aborting scan");
                        store_error = Some(err);
                        break;
                    }
                    if resolution.is_match() {
                        results.matched += 1;
                    }
                    file_name(&path)
                }
            };

            let _ = events.send(ScanEvent::Progress(ScanProgress {
                files_found: results.found,
                total_estimate: enumerated.load(Ordering::SeqCst),
                current_file,
            }));
        }
    }

    // The pipeline has been dropped, so a walker still running sees its
    // receiver gone and stops.
    let summary = match walker.await {
        Ok(summary) => Some(summary),
        Err(err) => {
            error!(scan_id = %scan_id, error = %err, "Folder walk died");
            None
        }
    };

    results.status = if store_error.is_some() || summary.is_none() {
        ScanStatus::Failed
    } else if pipeline_cut.load(Ordering::SeqCst)
        || summary.as_ref().is_some_and(|s| s.stopped_early)
    {
        ScanStatus::Cancelled
    } else {
        ScanStatus::Completed
    };

    if results.status == ScanStatus::Completed && inner.options.sweep_missing {
        let complete = summary.map(|s| s.complete_folders).unwrap_or_default();
        for folder in &complete {
            match inner.store.sweep_missing(folder, &seen) {
                Ok(removed) => results.removed += u32::try_from(removed).unwrap_or(u32::MAX),
                Err(err) => {
                    error!(scan_id = %scan_id, folder = %folder.display(), error = %err, "Sweep failed");
                    results.status = ScanStatus::Failed;
                    store_error = Some(err);
                    break;
                }
            }
        }
    }

    let totals = ScanTotals {
        status: results.status,
        items_found: results.found,
        items_matched: results.matched,
        error_count: u32::try_from(results.errors.len()).unwrap_or(u32::MAX),
        items_removed: results.removed,
    };
    if let Err(err) = inner.store.finish_scan(scan_id, totals) {
        warn!(scan_id = %scan_id, error = %err, "Could not record scan history");
    }

    info!(
        scan_id = %scan_id,
        status = %results.status,
        found = results.found,
        matched = results.matched,
        errors = results.errors.len(),
        lookup_failures = results.lookup_failures,
        removed = results.removed,
        "Scan finished"
    );
    let _ = events.send(ScanEvent::Finished(results.clone()));

    match store_error {
        Some(err) => Err(ScanError::Store(err)),
        None => Ok(results),
    }
}
