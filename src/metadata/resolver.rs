//! Multi-provider metadata resolution.
//!
//! The [`MetadataResolver`] queries catalog providers in preference order
//! until one answers, then lets enrichment providers fill the rating and
//! synopsis the catalog record left empty. Every provider call runs under its
//! own timeout; a failed or slow provider is recorded and skipped.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reelshelf_common::MediaKind;
use tracing::{debug, warn};

use super::cache::{CacheKey, LookupCache};
use super::provider::{
    Identity, LookupError, LookupFailure, LookupResult, MetadataProvider, MetadataRecord,
    MetadataResult, Resolution,
};
use super::providers::{OmdbProvider, TmdbProvider};
use crate::config::Config;

/// Composes catalog and enrichment providers behind one lookup surface.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use reelshelf::metadata::MetadataResolver;
///
/// let resolver = MetadataResolver::new(Duration::from_secs(8))
///     .with_catalog(Arc::new(tmdb))
///     .with_enrichment(Arc::new(omdb));
///
/// let resolution = resolver.resolve(&identity).await;
/// ```
pub struct MetadataResolver {
    catalog: Vec<Arc<dyn MetadataProvider>>,
    enrichment: Vec<Arc<dyn MetadataProvider>>,
    timeout: Duration,
    cache: Option<LookupCache>,
}

impl MetadataResolver {
    /// A resolver with no providers; every lookup is a miss.
    pub fn new(timeout: Duration) -> Self {
        Self {
            catalog: Vec::new(),
            enrichment: Vec::new(),
            timeout,
            cache: None,
        }
    }

    /// Build the TMDB + OMDb resolver described by `config`.
    ///
    /// Providers without an API key are registered but report themselves
    /// unavailable, so lookups skip them.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        let tmdb_cfg = &config.providers.tmdb;
        let tmdb = TmdbProvider::new(
            tmdb_cfg.api_key.clone().unwrap_or_default(),
            tmdb_cfg.language.clone(),
        )?
        .with_base_url(&tmdb_cfg.base_url)
        .with_image_base(&tmdb_cfg.image_base_url);

        let omdb_cfg = &config.providers.omdb;
        let omdb = OmdbProvider::new(omdb_cfg.api_key.clone().unwrap_or_default())?
            .with_base_url(&omdb_cfg.base_url)
            .with_daily_limit(omdb_cfg.daily_limit);

        Ok(Self::new(config.scan.lookup_timeout())
            .with_catalog(Arc::new(tmdb))
            .with_enrichment(Arc::new(omdb))
            .with_cache(config.cache.ttl(), config.cache.capacity))
    }

    /// Append a catalog provider. Earlier providers win.
    pub fn with_catalog(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.catalog.push(provider);
        self
    }

    /// Append an enrichment provider.
    pub fn with_enrichment(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.enrichment.push(provider);
        self
    }

    pub fn with_cache(mut self, ttl: Duration, capacity: usize) -> Self {
        self.cache = Some(LookupCache::new(ttl, capacity));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Names of the providers that would currently be queried.
    pub fn available_providers(&self) -> Vec<&'static str> {
        self.catalog
            .iter()
            .chain(self.enrichment.iter())
            .filter(|p| p.is_available())
            .map(|p| p.name())
            .collect()
    }

    pub fn has_available_providers(&self) -> bool {
        !self.available_providers().is_empty()
    }

    /// Resolve a parsed identity.
    ///
    /// `Other` identities are a miss without any provider being called.
    pub async fn resolve(&self, identity: &Identity) -> Resolution {
        if !identity.kind.is_candidate() {
            return Resolution::no_match();
        }
        let key = CacheKey::for_identity(identity);
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let resolution = self
            .merge(
                |p| p.resolve(identity),
                |p, imdb_id| match imdb_id {
                    Some(imdb_id) => async move { p.lookup_by_id(&imdb_id).await }.boxed(),
                    None => p.resolve(identity),
                },
            )
            .await;

        self.remember(key, &resolution);
        resolution
    }

    pub async fn lookup_by_title_year(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Resolution {
        self.resolve(&Identity::new(kind, title, year)).await
    }

    pub async fn lookup_by_id(&self, external_id: &str) -> Resolution {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Resolution::no_match();
        }
        let key = CacheKey::for_id(external_id);
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let resolution = self
            .merge(
                |p| p.lookup_by_id(external_id),
                |p, imdb_id| {
                    let id = imdb_id.unwrap_or_else(|| external_id.to_string());
                    async move { p.lookup_by_id(&id).await }.boxed()
                },
            )
            .await;

        self.remember(key, &resolution);
        resolution
    }

    /// First catalog hit, then enrichment. Without a catalog hit the first
    /// enrichment record is used as is. Enrichment of a found record is
    /// called with its IMDb id, when it has one.
    async fn merge<'a, C, E>(&'a self, catalog_call: C, enrich_call: E) -> Resolution
    where
        C: Fn(&'a dyn MetadataProvider) -> BoxFuture<'a, LookupResult>,
        E: Fn(&'a dyn MetadataProvider, Option<String>) -> BoxFuture<'a, LookupResult>,
    {
        let mut failures = Vec::new();
        let mut record: Option<MetadataRecord> = None;

        for provider in self.catalog.iter().filter(|p| p.is_available()) {
            let provider = provider.as_ref();
            match self.guarded(provider, catalog_call(provider)).await {
                Ok(Some(found)) => {
                    record = Some(found);
                    break;
                }
                Ok(None) => {}
                Err(error) => failures.push(failure(provider, error)),
            }
        }

        for provider in self.enrichment.iter().filter(|p| p.is_available()) {
            let provider = provider.as_ref();
            let call = match &record {
                Some(base) if base.is_enriched() => break,
                Some(base) => enrich_call(provider, base.imdb_id().map(str::to_owned)),
                None => catalog_call(provider),
            };
            match self.guarded(provider, call).await {
                Ok(Some(extra)) => match record.as_mut() {
                    Some(base) => base.fill_from(&extra),
                    None => record = Some(extra),
                },
                Ok(None) => {}
                Err(error) => failures.push(failure(provider, error)),
            }
        }

        Resolution {
            result: match record {
                Some(record) => MetadataResult::Found(record),
                None => MetadataResult::NoMatch,
            },
            failures,
        }
    }

    async fn guarded(
        &self,
        provider: &dyn MetadataProvider,
        call: BoxFuture<'_, LookupResult>,
    ) -> LookupResult {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        };
        match &outcome {
            Ok(Some(record)) => debug!(provider = provider.name(), title = %record.title, "Lookup hit"),
            Ok(None) => debug!(provider = provider.name(), "Lookup miss"),
            Err(error) => warn!(provider = provider.name(), %error, "Lookup failed"),
        }
        outcome
    }

    fn cached(&self, key: &CacheKey) -> Option<Resolution> {
        let result = self.cache.as_ref()?.get(key)?;
        debug!(?key, "Lookup cache hit");
        Some(Resolution {
            result,
            failures: Vec::new(),
        })
    }

    fn remember(&self, key: CacheKey, resolution: &Resolution) {
        if let Some(cache) = &self.cache {
            if resolution.failures.is_empty() {
                cache.insert(key, resolution.result.clone());
            }
        }
    }
}

fn failure(provider: &dyn MetadataProvider, error: LookupError) -> LookupFailure {
    LookupFailure {
        provider: provider.name().to_string(),
        error,
    }
}
