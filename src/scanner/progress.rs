//! Scan events and results.

use std::path::PathBuf;

use reelshelf_common::{ScanId, ScanStatus};
use serde::Serialize;

/// Snapshot sent after each enumerated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Movies and TV shows processed so far.
    pub files_found: u32,
    /// Video files enumerated so far; final once enumeration is done.
    pub total_estimate: u32,
    /// Name of the file just processed.
    pub current_file: String,
}

/// A per-file or per-folder problem. The scan carried on past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanErrorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub error: String,
}

impl ScanErrorEntry {
    pub fn for_file(file: impl Into<String>, error: impl ToString) -> Self {
        Self {
            file: Some(file.into()),
            folder: None,
            error: error.to_string(),
        }
    }

    pub fn for_folder(folder: impl Into<String>, error: impl ToString) -> Self {
        Self {
            file: None,
            folder: Some(folder.into()),
            error: error.to_string(),
        }
    }
}

/// Outcome of one scan run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResults {
    pub scan_id: ScanId,
    pub status: ScanStatus,
    /// Movies and TV shows processed.
    pub found: u32,
    /// Items that resolved to metadata.
    pub matched: u32,
    pub errors: Vec<ScanErrorEntry>,
    /// Files whose lookup hit at least one unavailable service.
    pub lookup_failures: u32,
    /// Stale items dropped by the sweep.
    pub removed: u32,
}

impl ScanResults {
    pub(crate) fn new(scan_id: ScanId) -> Self {
        Self {
            scan_id,
            status: ScanStatus::Running,
            found: 0,
            matched: 0,
            errors: Vec::new(),
            lookup_failures: 0,
            removed: 0,
        }
    }
}

/// Everything a scan reports while it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Started {
        scan_id: ScanId,
        folders: Vec<PathBuf>,
    },
    Progress(ScanProgress),
    FileFailed(ScanErrorEntry),
    Finished(ScanResults),
}
