//! Bounded TTL cache for resolved lookups.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reelshelf_common::MediaKind;

use super::matching::normalize;
use super::provider::{Identity, MetadataResult};

/// What a cached answer was looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Title {
        kind: MediaKind,
        title: String,
        year: Option<u16>,
    },
    Id(String),
}

impl CacheKey {
    /// Key for an identity. Titles that normalize alike share an entry.
    pub fn for_identity(identity: &Identity) -> Self {
        CacheKey::Title {
            kind: identity.kind,
            title: normalize(&identity.title),
            year: identity.year,
        }
    }

    pub fn for_id(external_id: &str) -> Self {
        CacheKey::Id(external_id.trim().to_string())
    }
}

/// Lookup results kept for `ttl`, at most `capacity` at a time.
///
/// When full, expired entries are purged first and then the oldest entry is
/// evicted.
pub struct LookupCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, (Instant, MetadataResult)>>,
}

impl LookupCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<MetadataResult> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((stored_at, result)) if stored_at.elapsed() < self.ttl => Some(result.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, result: MetadataResult) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, (stored_at, _))| *stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(key, (Instant::now(), result));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
