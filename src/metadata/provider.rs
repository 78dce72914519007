//! Trait definition and types for metadata providers.
//!
//! This module defines the [`MetadataProvider`] trait that every external
//! lookup service (TMDB, OMDb) implements, along with the record and error
//! types those lookups return.

use std::time::Duration;

use async_trait::async_trait;
use reelshelf_common::MediaKind;
use reelshelf_parser::{MediaType, ParsedFilename};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The structured guess produced from a filename, as handed to providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u16>,
    pub episode: Option<u16>,
}

impl Identity {
    pub fn new(kind: MediaKind, title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            kind,
            title: title.into(),
            year,
            season: None,
            episode: None,
        }
    }
}

impl From<&ParsedFilename> for Identity {
    fn from(parsed: &ParsedFilename) -> Self {
        let kind = match parsed.media_type {
            MediaType::Movie => MediaKind::Movie,
            MediaType::TvShow => MediaKind::TvShow,
            MediaType::Other => MediaKind::Other,
        };
        Self {
            kind,
            title: parsed.title.clone(),
            year: parsed.year,
            season: parsed.season,
            episode: parsed.episode,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Metadata for a movie or TV show as returned by a single provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Canonical title.
    pub title: String,
    /// Release or premiere year.
    pub year: Option<u16>,
    /// IMDb id when the provider knows it, otherwise a provider-scoped id
    /// such as `tmdb:movie:603`.
    pub external_id: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    /// Audience rating on a 0-10 scale.
    pub rating: Option<f64>,
    pub synopsis: Option<String>,
    /// Name of the provider that produced the record.
    pub source: String,
}

impl MetadataRecord {
    /// The IMDb id, if `external_id` is one.
    pub fn imdb_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .filter(|id| is_imdb_id(id))
    }

    /// Whether the enrichment fields are already populated.
    pub fn is_enriched(&self) -> bool {
        self.rating.is_some() && self.synopsis.is_some()
    }

    /// Fill `rating` and `synopsis` from `other` where this record has none.
    /// Every other field keeps its current value.
    pub fn fill_from(&mut self, other: &MetadataRecord) {
        if self.rating.is_none() {
            self.rating = other.rating;
        }
        if self.synopsis.is_none() {
            self.synopsis = other.synopsis.clone();
        }
    }
}

/// `tt` followed by digits.
pub fn is_imdb_id(id: &str) -> bool {
    id.len() > 2 && id.starts_with("tt") && id[2..].bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Why a lookup could not be answered.
///
/// A completed lookup that found nothing is `Ok(None)`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else if err.is_timeout() {
            LookupError::Timeout(Duration::ZERO)
        } else {
            LookupError::Unavailable(err.to_string())
        }
    }
}

pub type LookupResult = Result<Option<MetadataRecord>, LookupError>;

/// One provider's failure during a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupFailure {
    pub provider: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: LookupError,
}

fn serialize_display<S: serde::Serializer>(err: &LookupError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// The merged answer for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum MetadataResult {
    Found(MetadataRecord),
    NoMatch,
}

impl MetadataResult {
    pub fn record(&self) -> Option<&MetadataRecord> {
        match self {
            MetadataResult::Found(record) => Some(record),
            MetadataResult::NoMatch => None,
        }
    }

    pub fn into_record(self) -> Option<MetadataRecord> {
        match self {
            MetadataResult::Found(record) => Some(record),
            MetadataResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MetadataResult::Found(_))
    }
}

/// A [`MetadataResult`] plus every provider failure met on the way.
///
/// Storage only looks at `result`; `failures` lets callers tell
/// "nothing matched" apart from "a service could not be reached".
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: MetadataResult,
    pub failures: Vec<LookupFailure>,
}

impl Resolution {
    pub fn no_match() -> Self {
        Self {
            result: MetadataResult::NoMatch,
            failures: Vec::new(),
        }
    }

    pub fn found(record: MetadataRecord) -> Self {
        Self {
            result: MetadataResult::Found(record),
            failures: Vec::new(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.result.is_match()
    }

    /// No record, and at least one provider failed rather than missed.
    pub fn is_unavailable(&self) -> bool {
        !self.is_match() && !self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A source of movie and TV show metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short identifier used in logs and failure reports (e.g. "tmdb").
    fn name(&self) -> &'static str;

    /// Whether the provider is configured and may be queried.
    fn is_available(&self) -> bool;

    /// Best match for a title and optional year.
    async fn lookup_by_title_year(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> LookupResult;

    /// Record for an id previously returned in [`MetadataRecord::external_id`].
    async fn lookup_by_id(&self, external_id: &str) -> LookupResult;

    /// Best match for a parsed identity.
    async fn resolve(&self, identity: &Identity) -> LookupResult {
        self.lookup_by_title_year(identity.kind, &identity.title, identity.year)
            .await
    }
}
