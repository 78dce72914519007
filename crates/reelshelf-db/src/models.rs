//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use reelshelf_common::{ItemId, MediaKind, ScanId, ScanStatus};
use serde::{Deserialize, Serialize};

/// One indexed media file.
///
/// `file_path` is the natural key. `play_count`, `last_played` and
/// `date_added` belong to the first insert and survive every later upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryItem {
    pub id: ItemId,
    pub file_path: String,
    pub file_size: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u16>,
    pub episode: Option<u16>,
    pub external_id: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<f64>,
    pub synopsis: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub last_played: Option<DateTime<Utc>>,
    pub play_count: u32,
    pub date_added: DateTime<Utc>,
    pub original_filename: String,
}

impl LibraryItem {
    /// A fresh, never-played item with no metadata.
    pub fn new(
        file_path: impl Into<String>,
        media_type: MediaKind,
        title: impl Into<String>,
    ) -> Self {
        let file_path = file_path.into();
        let original_filename = std::path::Path::new(&file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            file_path,
            file_size: 0,
            media_type,
            title: title.into(),
            year: None,
            season: None,
            episode: None,
            external_id: None,
            poster_url: None,
            backdrop_url: None,
            genres: Vec::new(),
            rating: None,
            synopsis: None,
            last_modified: now,
            last_played: None,
            play_count: 0,
            date_added: now,
            original_filename,
        }
    }
}

/// A partial metadata update for one stored item.
///
/// `None` leaves the stored value as it is. Play history, the file path and
/// the scanned file facts are never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub external_id: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub synopsis: Option<String>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One scan run as recorded in history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRecord {
    pub id: ScanId,
    pub folders: Vec<String>,
    pub status: ScanStatus,
    pub items_found: u32,
    pub items_matched: u32,
    pub error_count: u32,
    pub items_removed: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Item counts by media kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryStats {
    pub total: u64,
    pub movies: u64,
    pub tv_shows: u64,
    pub other: u64,
}
