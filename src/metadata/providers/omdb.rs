//! OMDb metadata provider.
//!
//! Used as the ratings and plot source. OMDb answers with HTTP 200 even for
//! errors; the `Response` field says whether the lookup succeeded.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use reelshelf_common::MediaKind;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{parse_year, present, urlencoded};
use crate::metadata::matching::{confidence, MIN_CONFIDENCE};
use crate::metadata::provider::{
    is_imdb_id, LookupError, LookupResult, MetadataProvider, MetadataRecord,
};

pub const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";
pub const DEFAULT_DAILY_LIMIT: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    error: Option<String>,
    title: Option<String>,
    year: Option<String>,
    genre: Option<String>,
    plot: Option<String>,
    poster: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
}

/// Requests spent today.
struct Budget {
    day: NaiveDate,
    used: u32,
}

/// OMDb metadata provider with a per-day request budget.
pub struct OmdbProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    daily_limit: u32,
    budget: Mutex<Budget>,
}

impl OmdbProvider {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: OMDB_BASE_URL.to_string(),
            daily_limit: DEFAULT_DAILY_LIMIT,
            budget: Mutex::new(Budget {
                day: Utc::now().date_naive(),
                used: 0,
            }),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }

    /// Requests left before the budget resets at UTC midnight.
    pub fn remaining_requests(&self) -> u32 {
        let mut budget = self.budget.lock();
        roll_over(&mut budget);
        self.daily_limit.saturating_sub(budget.used)
    }

    fn spend(&self) -> Result<(), LookupError> {
        let mut budget = self.budget.lock();
        roll_over(&mut budget);
        if budget.used >= self.daily_limit {
            warn!(limit = self.daily_limit, "OMDb daily request limit reached");
            return Err(LookupError::Unavailable(
                "OMDb daily request limit reached".into(),
            ));
        }
        budget.used += 1;
        Ok(())
    }

    fn url(&self, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}?apikey={}", self.base_url, urlencoded(&self.api_key));
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<Option<OmdbResponse>, LookupError> {
        self.spend()?;

        let resp = self.client.get(self.url(params)).send().await?;
        if !resp.status().is_success() {
            return Err(LookupError::Unavailable(format!(
                "OMDb returned {}",
                resp.status()
            )));
        }

        let body: OmdbResponse = resp
            .json()
            .await
            .map_err(|e| LookupError::Decode(format!("OMDb response: {e}")))?;

        if body.response.eq_ignore_ascii_case("true") {
            return Ok(Some(body));
        }

        let error = body.error.unwrap_or_else(|| "unknown error".to_string());
        if error.to_ascii_lowercase().contains("not found") {
            Ok(None)
        } else {
            Err(LookupError::Unavailable(format!("OMDb: {error}")))
        }
    }

    fn to_record(&self, body: OmdbResponse) -> MetadataRecord {
        MetadataRecord {
            title: present(body.title).unwrap_or_default(),
            year: parse_year(body.year.as_deref()),
            external_id: present(body.imdb_id),
            poster_url: present(body.poster),
            backdrop_url: None,
            genres: present(body.genre)
                .map(|g| {
                    g.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            rating: present(body.imdb_rating).and_then(|r| r.parse::<f64>().ok()),
            synopsis: present(body.plot),
            source: self.name().to_string(),
        }
    }
}

fn roll_over(budget: &mut Budget) {
    let today = Utc::now().date_naive();
    if budget.day != today {
        budget.day = today;
        budget.used = 0;
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
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
        let kind_param = match kind {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "series",
            MediaKind::Other => return Ok(None),
        };

        let year_str = year.map(|y| y.to_string());
        let mut params = vec![("t", title), ("type", kind_param), ("plot", "short")];
        if let Some(ref y) = year_str {
            params.push(("y", y.as_str()));
        }

        debug!(title, year = ?year, "OMDb lookup by title");
        let Some(body) = self.fetch(&params).await? else {
            return Ok(None);
        };

        let record = self.to_record(body);
        let score = confidence(title, &record.title, year, record.year);
        if score < MIN_CONFIDENCE {
            debug!(title, candidate = %record.title, score, "OMDb match below threshold");
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn lookup_by_id(&self, external_id: &str) -> LookupResult {
        let external_id = external_id.trim();
        if !is_imdb_id(external_id) {
            return Ok(None);
        }

        debug!(imdb_id = external_id, "OMDb lookup by id");
        let body = self.fetch(&[("i", external_id), ("plot", "short")]).await?;
        Ok(body.map(|b| self.to_record(b)))
    }
}
