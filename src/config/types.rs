use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use reelshelf_common::paths::VIDEO_EXTENSIONS;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root folders scanned when no folders are given explicitly.
    #[serde(default)]
    pub folders: Vec<PathBuf>,

    /// SQLite catalog location. `~` is expanded.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// File extensions treated as video, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_database() -> PathBuf {
    PathBuf::from("~/.local/share/reelshelf/library.db")
}
fn default_extensions() -> Vec<String> {
    VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            database: default_database(),
            extensions: default_extensions(),
        }
    }
}

impl LibraryConfig {
    pub fn database_path(&self) -> PathBuf {
        expand(&self.database)
    }

    pub fn folder_paths(&self) -> Vec<PathBuf> {
        self.folders.iter().map(|folder| expand(folder)).collect()
    }
}

fn expand(path: &std::path::Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Metadata lookups in flight at once.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Per-call timeout for each external lookup.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Drop catalog entries whose files were not seen by a completed scan.
    #[serde(default = "default_sweep_missing")]
    pub sweep_missing: bool,
}

fn default_lookup_concurrency() -> usize {
    4
}
fn default_lookup_timeout() -> u64 {
    8
}
fn default_sweep_missing() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookup_concurrency: default_lookup_concurrency(),
            lookup_timeout_secs: default_lookup_timeout(),
            sweep_missing: default_sweep_missing(),
        }
    }
}

impl ScanConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub omdb: OmdbConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_language")]
    pub language: String,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}
fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: default_tmdb_language(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_omdb_base_url")]
    pub base_url: String,

    /// Requests allowed per UTC day.
    #[serde(default = "default_omdb_daily_limit")]
    pub daily_limit: u32,
}

fn default_omdb_base_url() -> String {
    "https://www.omdbapi.com/".to_string()
}
fn default_omdb_daily_limit() -> u32 {
    1000
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_omdb_base_url(),
            daily_limit: default_omdb_daily_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_ttl() -> u64 {
    3600
}
fn default_cache_capacity() -> usize {
    512
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
