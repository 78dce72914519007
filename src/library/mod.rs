//! The persisted media catalog.
//!
//! [`LibraryStore`] owns every [`LibraryItem`] and all scan history. It is a
//! thin, cloneable handle over the SQLite pool; each call checks out a
//! connection for its own duration, so scans and queries interleave freely.

pub mod collection;

pub use collection::{CollectionFilter, DisplayItem, LibraryCollection, SortKey};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use reelshelf_common::{Error, ItemId, MediaKind, Result, ScanId, ScanStatus};
use reelshelf_db::models::{LibraryItem, LibraryStats, MetadataPatch, ScanRecord};
use reelshelf_db::pool::{get_conn, init_memory_pool, init_pool, DbPool};
use reelshelf_db::queries::items::{self, ItemFilter};
use reelshelf_db::queries::scan_history::{self, ScanTotals};
use tracing::{debug, info};

/// Handle to the catalog database.
#[derive(Clone)]
pub struct LibraryStore {
    pool: DbPool,
}

impl LibraryStore {
    /// Open (creating if needed) the catalog at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::invalid_input(format!("non UTF-8 database path: {path:?}")))?;
        debug!(path = path_str, "Opening catalog");
        Ok(Self {
            pool: init_pool(path_str)?,
        })
    }

    /// A private catalog that lives as long as the store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: init_memory_pool()?,
        })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Insert `item`, or merge it into the record already stored for its
    /// path. Play history and `date_added` of an existing record are kept.
    pub fn upsert(&self, item: &LibraryItem) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        items::upsert_item(&conn, item)
    }

    pub fn get(&self, id: ItemId) -> Result<Option<LibraryItem>> {
        let conn = get_conn(&self.pool)?;
        items::get_item(&conn, id)
    }

    pub fn get_by_path(&self, path: &str) -> Result<Option<LibraryItem>> {
        let conn = get_conn(&self.pool)?;
        items::get_item_by_path(&conn, path)
    }

    /// Items matching `filter`, ordered by file path.
    pub fn get_all(&self, filter: &ItemFilter) -> Result<Vec<LibraryItem>> {
        let conn = get_conn(&self.pool)?;
        items::list_items(&conn, filter)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = get_conn(&self.pool)?;
        items::count_items(&conn)
    }

    pub fn stats(&self) -> Result<LibraryStats> {
        let conn = get_conn(&self.pool)?;
        items::stats(&conn)
    }

    /// Distinct genres, sorted.
    pub fn genres(&self, kind: Option<MediaKind>) -> Result<Vec<String>> {
        let conn = get_conn(&self.pool)?;
        items::list_genres(&conn, kind)
    }

    /// Count one playback of `id` and return the updated item.
    pub fn record_playback(&self, id: ItemId) -> Result<LibraryItem> {
        let conn = get_conn(&self.pool)?;
        if !items::record_playback(&conn, id, Utc::now())? {
            return Err(Error::not_found(id.to_string()));
        }
        items::get_item(&conn, id)?.ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Overwrite the metadata fields set in `patch` and return the updated
    /// item. Play history is untouched.
    pub fn update_metadata(&self, id: ItemId, patch: &MetadataPatch) -> Result<LibraryItem> {
        let conn = get_conn(&self.pool)?;
        if !items::update_metadata(&conn, id, patch)? {
            return Err(Error::not_found(id.to_string()));
        }
        debug!(item_id = %id, "Metadata updated");
        items::get_item(&conn, id)?.ok_or_else(|| Error::not_found(id.to_string()))
    }

    pub fn remove(&self, id: ItemId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        items::delete_item(&conn, id)
    }

    /// Drop every item. Scan history is kept.
    pub fn clear(&self) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        let removed = items::delete_all_items(&conn)?;
        info!(removed, "Catalog cleared");
        Ok(removed)
    }

    /// Delete stored items under `folder` whose path is not in `seen`.
    pub fn sweep_missing(&self, folder: &Path, seen: &HashSet<String>) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        let stale: Vec<ItemId> = items::list_paths(&conn)?
            .into_iter()
            .filter(|(_, path)| Path::new(path).starts_with(folder) && !seen.contains(path))
            .map(|(id, _)| id)
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }
        let removed = items::delete_items(&conn, &stale)?;
        info!(folder = %folder.display(), removed, "Swept missing files");
        Ok(removed)
    }

    /// Record the start of a scan run.
    pub fn begin_scan(&self, folders: &[PathBuf]) -> Result<ScanRecord> {
        let record = ScanRecord {
            id: ScanId::new(),
            folders: folders
                .iter()
                .map(|f| f.to_string_lossy().into_owned())
                .collect(),
            status: ScanStatus::Running,
            items_found: 0,
            items_matched: 0,
            error_count: 0,
            items_removed: 0,
            started_at: Utc::now(),
            finished_at: None,
        };
        let conn = get_conn(&self.pool)?;
        scan_history::insert_scan(&conn, &record)?;
        Ok(record)
    }

    pub fn finish_scan(&self, id: ScanId, totals: ScanTotals) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if !scan_history::finish_scan(&conn, id, totals, Utc::now())? {
            return Err(Error::not_found(format!("scan {id}")));
        }
        Ok(())
    }

    /// Most recent runs first.
    pub fn scan_history(&self, limit: u32) -> Result<Vec<ScanRecord>> {
        let conn = get_conn(&self.pool)?;
        scan_history::list_scans(&conn, limit)
    }
}
