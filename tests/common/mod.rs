//! Shared helpers for integration tests.
//!
//! Provides [`StubProvider`], a scripted metadata provider, and helpers for
//! laying out media folders and building scanners over an in-memory catalog.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reelshelf::library::LibraryStore;
use reelshelf::metadata::{LookupError, LookupResult, MetadataProvider, MetadataRecord, MetadataResolver};
use reelshelf::scanner::{LibraryScanner, ScanOptions};
use reelshelf_common::MediaKind;

/// Provider that echoes the queried title back as a match.
///
/// Titles listed in `misses` get no match; `unavailable` makes every call
/// fail as if the service were down.
pub struct StubProvider {
    delay: Duration,
    misses: Vec<String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            misses: Vec::new(),
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn missing(mut self, title: &str) -> Self {
        self.misses.push(title.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn lookup_by_title_year(
        &self,
        _kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> LookupResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.unavailable {
            return Err(LookupError::Unavailable("stub is down".into()));
        }
        if self.misses.iter().any(|miss| miss == title) {
            return Ok(None);
        }
        Ok(Some(MetadataRecord {
            title: title.to_string(),
            year,
            external_id: Some(format!("stub:{}", title.to_lowercase().replace(' ', "-"))),
            genres: vec!["Drama".into()],
            rating: Some(7.5),
            synopsis: Some(format!("About {title}.")),
            source: "stub".into(),
            ..Default::default()
        }))
    }

    async fn lookup_by_id(&self, _external_id: &str) -> LookupResult {
        Ok(None)
    }
}

/// Create empty files named `names` under `dir`, creating subfolders.
pub fn touch(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, b"not really a video").unwrap();
            path
        })
        .collect()
}

pub fn resolver_with(provider: Arc<StubProvider>) -> Arc<MetadataResolver> {
    Arc::new(MetadataResolver::new(Duration::from_secs(5)).with_catalog(provider))
}

/// Scanner over a fresh in-memory catalog.
pub fn scanner_with(provider: Arc<StubProvider>, concurrency: usize) -> (LibraryScanner, LibraryStore) {
    let store = LibraryStore::in_memory().unwrap();
    let options = ScanOptions {
        concurrency,
        ..ScanOptions::default()
    };
    let scanner = LibraryScanner::new(store.clone(), resolver_with(provider), options);
    (scanner, store)
}
