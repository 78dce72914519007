//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - Confidence-scored search; the best candidate is fetched in full.
//! - IMDb ids are resolved through the `/find` endpoint.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reelshelf_common::MediaKind;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{parse_year, present, urlencoded};
use crate::metadata::matching::{confidence, MIN_CONFIDENCE};
use crate::metadata::provider::{
    is_imdb_id, LookupError, LookupResult, MetadataProvider, MetadataRecord,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::MIN.saturating_add(3);

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvSearchResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    id: u64,
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    genres: Option<Vec<TmdbGenre>>,
    imdb_id: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetail {
    id: u64,
    name: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    genres: Option<Vec<TmdbGenre>>,
    external_ids: Option<TmdbExternalIds>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbIdOnly>,
    #[serde(default)]
    tv_results: Vec<TmdbIdOnly>,
}

#[derive(Debug, Deserialize)]
struct TmdbIdOnly {
    id: u64,
}

/// A search hit with its score.
struct Candidate {
    id: u64,
    score: f64,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use reelshelf::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into()).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a new TMDB provider with the given API key and language.
    ///
    /// The `language` parameter should be a tag such as `"en-US"`. Rate
    /// limiting is configured at 4 requests per second.
    pub fn new(api_key: String, language: String) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND));

        Ok(Self {
            client,
            api_key,
            language,
            base_url: TMDB_BASE_URL.to_string(),
            image_base: TMDB_IMAGE_BASE.to_string(),
            rate_limiter,
        })
    }

    /// Point the provider at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point image URLs at a different CDN root.
    pub fn with_image_base(mut self, image_base: impl Into<String>) -> Self {
        self.image_base = image_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    ///
    /// A 404 is `Ok(None)`.
    async fn get(&self, url: &str) -> Result<Option<reqwest::Response>, LookupError> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self.client.get(url).send().await?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return match resp.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => Ok(Some(resp)),
                StatusCode::UNAUTHORIZED => {
                    Err(LookupError::Unavailable("TMDB rejected the API key".into()))
                }
                status => Err(LookupError::Unavailable(format!("TMDB returned {status}"))),
            };
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, LookupError> {
        match self.get(url).await? {
            Some(resp) => {
                let body = resp
                    .json::<T>()
                    .await
                    .map_err(|e| LookupError::Decode(format!("TMDB response: {e}")))?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoded(&self.api_key),
            urlencoded(&self.language)
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    fn image_url(&self, size: &str, path: Option<String>) -> Option<String> {
        present(path).map(|p| format!("{}/{size}{p}", self.image_base))
    }

    async fn search_movie(&self, title: &str, year: Option<u16>) -> Result<Vec<Candidate>, LookupError> {
        let mut params = vec![("query", title)];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("year", y.as_str()));
        }

        let url = self.url("/search/movie", &params);
        debug!(title, year = ?year, "TMDB search movie");

        let body: Option<TmdbSearchResponse<TmdbMovieSearchResult>> = self.get_json(&url).await?;
        Ok(body
            .map(|b| b.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| Candidate {
                id: r.id,
                score: confidence(
                    title,
                    r.title.as_deref().unwrap_or_default(),
                    year,
                    parse_year(r.release_date.as_deref()),
                ),
            })
            .collect())
    }

    async fn search_tv(&self, title: &str, year: Option<u16>) -> Result<Vec<Candidate>, LookupError> {
        let url = self.url("/search/tv", &[("query", title)]);
        debug!(title, "TMDB search TV");

        let body: Option<TmdbSearchResponse<TmdbTvSearchResult>> = self.get_json(&url).await?;
        Ok(body
            .map(|b| b.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| Candidate {
                id: r.id,
                score: confidence(
                    title,
                    r.name.as_deref().unwrap_or_default(),
                    year,
                    parse_year(r.first_air_date.as_deref()),
                ),
            })
            .collect())
    }

    async fn movie_details(&self, id: u64) -> LookupResult {
        let url = self.url(&format!("/movie/{id}"), &[]);
        debug!(tmdb_id = id, "TMDB get movie details");

        let Some(detail) = self.get_json::<TmdbMovieDetail>(&url).await? else {
            return Ok(None);
        };

        Ok(Some(MetadataRecord {
            title: detail.title.unwrap_or_default(),
            year: parse_year(detail.release_date.as_deref()),
            external_id: Some(
                present(detail.imdb_id).unwrap_or_else(|| format!("tmdb:movie:{}", detail.id)),
            ),
            poster_url: self.image_url(POSTER_SIZE, detail.poster_path),
            backdrop_url: self.image_url(BACKDROP_SIZE, detail.backdrop_path),
            genres: genre_names(detail.genres),
            rating: rating(detail.vote_average, detail.vote_count),
            synopsis: present(detail.overview),
            source: self.name().to_string(),
        }))
    }

    async fn tv_details(&self, id: u64) -> LookupResult {
        let url = self.url(
            &format!("/tv/{id}"),
            &[("append_to_response", "external_ids")],
        );
        debug!(tmdb_id = id, "TMDB get TV details");

        let Some(detail) = self.get_json::<TmdbTvDetail>(&url).await? else {
            return Ok(None);
        };

        let imdb_id = present(detail.external_ids.and_then(|ext| ext.imdb_id));
        Ok(Some(MetadataRecord {
            title: detail.name.unwrap_or_default(),
            year: parse_year(detail.first_air_date.as_deref()),
            external_id: Some(imdb_id.unwrap_or_else(|| format!("tmdb:tv:{}", detail.id))),
            poster_url: self.image_url(POSTER_SIZE, detail.poster_path),
            backdrop_url: self.image_url(BACKDROP_SIZE, detail.backdrop_path),
            genres: genre_names(detail.genres),
            rating: rating(detail.vote_average, detail.vote_count),
            synopsis: present(detail.overview),
            source: self.name().to_string(),
        }))
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> LookupResult {
        let url = self.url(
            &format!("/find/{}", urlencoded(imdb_id)),
            &[("external_source", "imdb_id")],
        );
        debug!(imdb_id, "TMDB find by IMDb id");

        let Some(found) = self.get_json::<TmdbFindResponse>(&url).await? else {
            return Ok(None);
        };

        if let Some(movie) = found.movie_results.first() {
            return self.movie_details(movie.id).await;
        }
        if let Some(show) = found.tv_results.first() {
            return self.tv_details(show.id).await;
        }
        Ok(None)
    }
}

fn best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.score >= MIN_CONFIDENCE)
        .max_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn genre_names(genres: Option<Vec<TmdbGenre>>) -> Vec<String> {
    genres
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.name)
        .collect()
}

/// TMDB reports 0.0 for titles nobody has voted on.
fn rating(vote_average: Option<f64>, vote_count: Option<u32>) -> Option<f64> {
    match (vote_average, vote_count) {
        (Some(_), Some(0)) => None,
        (Some(avg), _) if avg > 0.0 => Some(avg),
        _ => None,
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn lookup_by_title_year(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> LookupResult {
        let candidates = match kind {
            MediaKind::Movie => self.search_movie(title, year).await?,
            MediaKind::TvShow => self.search_tv(title, year).await?,
            MediaKind::Other => return Ok(None),
        };

        match best(candidates) {
            Some(hit) => {
                debug!(title, tmdb_id = hit.id, score = hit.score, "TMDB match");
                match kind {
                    MediaKind::Movie => self.movie_details(hit.id).await,
                    _ => self.tv_details(hit.id).await,
                }
            }
            None => {
                debug!(title, "TMDB found no confident match");
                Ok(None)
            }
        }
    }

    async fn lookup_by_id(&self, external_id: &str) -> LookupResult {
        let external_id = external_id.trim();
        if is_imdb_id(external_id) {
            return self.find_by_imdb(external_id).await;
        }

        let parsed = external_id
            .strip_prefix("tmdb:")
            .and_then(|rest| rest.split_once(':'))
            .and_then(|(kind, id)| id.parse::<u64>().ok().map(|id| (kind, id)));

        match parsed {
            Some(("movie", id)) => self.movie_details(id).await,
            Some(("tv", id)) => self.tv_details(id).await,
            _ => Ok(None),
        }
    }
}
