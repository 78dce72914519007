//! Read-side projection of the catalog.
//!
//! [`LibraryCollection`] filters, sorts and paginates stored items and wraps
//! each one in the [`DisplayItem`] shape the UI shares with remote content
//! sources. It never writes.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reelshelf_common::{Error, ItemId, MediaKind, Result};
use reelshelf_db::models::LibraryItem;
use reelshelf_db::queries::items::ItemFilter;
use serde::{Deserialize, Serialize};

use super::LibraryStore;

pub const DEFAULT_LIMIT: usize = 50;

/// Rating shown for items nobody has rated yet, on the 0-10 scale.
const UNKNOWN_RATING: f64 = 5.0;

/// Sort orders offered by [`LibraryCollection::fetch`].
///
/// `Title` sorts ascending; every other key sorts descending with unknown
/// values last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Year,
    Rating,
    LastPlayed,
    PlayCount,
    #[default]
    DateAdded,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Year => "year",
            SortKey::Rating => "rating",
            SortKey::LastPlayed => "last_played",
            SortKey::PlayCount => "play_count",
            SortKey::DateAdded => "date_added",
        }
    }

    fn compare(&self, a: &LibraryItem, b: &LibraryItem) -> Ordering {
        match self {
            SortKey::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
            SortKey::Year => descending(a.year, b.year),
            SortKey::Rating => descending(a.rating, b.rating),
            SortKey::LastPlayed => descending(a.last_played, b.last_played),
            SortKey::PlayCount => descending(Some(a.play_count), Some(b.play_count)),
            SortKey::DateAdded => descending(Some(a.date_added), Some(b.date_added)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// Accepts `"last played"`, `"last_played"`, `"lastPlayed"` and so on.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "title" | "name" => Ok(SortKey::Title),
            "year" => Ok(SortKey::Year),
            "rating" => Ok(SortKey::Rating),
            "lastplayed" => Ok(SortKey::LastPlayed),
            "playcount" | "plays" => Ok(SortKey::PlayCount),
            "dateadded" | "added" | "recent" => Ok(SortKey::DateAdded),
            _ => Err(Error::invalid_input(format!("unknown sort key: {s}"))),
        }
    }
}

/// Larger first; `None` after every known value.
fn descending<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Query options for [`LibraryCollection::fetch`].
///
/// `media_type` and `genre` accept `"all"` to disable the filter.
/// `media_type` also accepts display names such as `"TV Shows"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionFilter {
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sorter: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl CollectionFilter {
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorter(mut self, sorter: impl Into<String>) -> Self {
        self.sorter = Some(sorter.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    fn item_filter(&self) -> Result<ItemFilter> {
        let media_type = match active(&self.media_type) {
            Some(kind) => Some(kind.parse::<MediaKind>()?),
            None => None,
        };
        Ok(ItemFilter {
            media_type,
            genre: active(&self.genre).map(str::to_string),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    fn sort_key(&self) -> Result<SortKey> {
        match self.sorter.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sorter) => sorter.parse(),
            None => Ok(SortKey::default()),
        }
    }
}

/// A filter value, or `None` when it is absent, blank or `"all"`.
fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

// ---------------------------------------------------------------------------
// Display shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRating {
    pub percentage: u32,
    pub watching: u32,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayImages {
    pub poster: Option<String>,
    pub fanart: Option<String>,
    pub banner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalTorrent {
    pub url: String,
    pub size: String,
    pub seed: u32,
    pub peer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTorrents {
    pub local: LocalTorrent,
}

/// A catalog item in the shape shared with remote content sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItem {
    pub id: ItemId,
    pub imdb_id: String,
    pub title: String,
    pub year: Option<u16>,
    pub media_type: MediaKind,
    pub season: Option<u16>,
    pub episode: Option<u16>,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub runtime: u32,
    pub rating: DisplayRating,
    pub images: DisplayImages,
    pub torrents: DisplayTorrents,
    pub file_path: String,
    pub last_played: Option<DateTime<Utc>>,
    pub play_count: u32,
    pub date_added: DateTime<Utc>,
}

impl From<&LibraryItem> for DisplayItem {
    fn from(item: &LibraryItem) -> Self {
        let percentage = (item.rating.unwrap_or(UNKNOWN_RATING) * 10.0)
            .round()
            .clamp(0.0, 100.0) as u32;

        DisplayItem {
            id: item.id,
            imdb_id: item
                .external_id
                .clone()
                .unwrap_or_else(|| format!("local_{}", item.id)),
            title: item.title.clone(),
            year: item.year,
            media_type: item.media_type,
            season: item.season,
            episode: item.episode,
            synopsis: item.synopsis.clone(),
            genres: item.genres.clone(),
            runtime: 0,
            rating: DisplayRating {
                percentage,
                watching: 0,
                votes: 0,
            },
            images: DisplayImages {
                poster: item.poster_url.clone(),
                fanart: item.backdrop_url.clone(),
                banner: item.backdrop_url.clone(),
            },
            torrents: DisplayTorrents {
                local: LocalTorrent {
                    url: format!("file://{}", item.file_path),
                    size: format_size(item.file_size),
                    seed: 0,
                    peer: 0,
                },
            },
            file_path: item.file_path.clone(),
            last_played: item.last_played,
            play_count: item.play_count,
            date_added: item.date_added,
        }
    }
}

/// Bytes as mebibytes with two decimals, e.g. `"700.00 MB"`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Filter/sort/paginate view over a [`LibraryStore`].
#[derive(Clone)]
pub struct LibraryCollection {
    store: LibraryStore,
}

impl LibraryCollection {
    pub fn new(store: LibraryStore) -> Self {
        Self { store }
    }

    /// Matching items, sorted and paginated, in display shape.
    pub fn fetch(&self, filter: &CollectionFilter) -> Result<Vec<DisplayItem>> {
        Ok(self.items(filter)?.iter().map(DisplayItem::from).collect())
    }

    /// Matching items, sorted and paginated.
    ///
    /// Ties under the sort key fall back to file path order.
    pub fn items(&self, filter: &CollectionFilter) -> Result<Vec<LibraryItem>> {
        let sort_key = filter.sort_key()?;
        let mut items = self.store.get_all(&filter.item_filter()?)?;

        items.sort_by(|a, b| {
            sort_key
                .compare(a, b)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });

        Ok(items
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(DEFAULT_LIMIT))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store_with(items: &[LibraryItem]) -> LibraryStore {
        let store = LibraryStore::in_memory().unwrap();
        for item in items {
            store.upsert(item).unwrap();
        }
        store
    }

    fn movie(path: &str, title: &str, year: Option<u16>) -> LibraryItem {
        let mut item = LibraryItem::new(path, MediaKind::Movie, title);
        item.year = year;
        item
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("last played".parse::<SortKey>().unwrap(), SortKey::LastPlayed);
        assert_eq!("play_count".parse::<SortKey>().unwrap(), SortKey::PlayCount);
        assert_eq!("lastPlayed".parse::<SortKey>().unwrap(), SortKey::LastPlayed);
        assert_eq!("Date Added".parse::<SortKey>().unwrap(), SortKey::DateAdded);
        assert!("popularity".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_descending_puts_unknown_last() {
        let mut years = vec![None, Some(1999), Some(2010), None, Some(2003)];
        years.sort_by(|a, b| descending(*a, *b));
        assert_eq!(years, vec![Some(2010), Some(2003), Some(1999), None, None]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive_ascending() {
        let collection = LibraryCollection::new(store_with(&[
            movie("/m/1.mkv", "heat", None),
            movie("/m/2.mkv", "Alien", None),
            movie("/m/3.mkv", "Brazil", None),
        ]));
        let titles: Vec<_> = collection
            .items(&CollectionFilter::default().sorter("title"))
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["Alien", "Brazil", "heat"]);
    }

    #[test]
    fn test_ties_broken_by_path() {
        let collection = LibraryCollection::new(store_with(&[
            movie("/m/c.mkv", "Same", Some(2000)),
            movie("/m/a.mkv", "Same", Some(2000)),
            movie("/m/b.mkv", "Same", Some(2000)),
        ]));
        let paths: Vec<_> = collection
            .items(&CollectionFilter::default().sorter("year"))
            .unwrap()
            .into_iter()
            .map(|i| i.file_path)
            .collect();
        assert_eq!(paths, vec!["/m/a.mkv", "/m/b.mkv", "/m/c.mkv"]);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let mut old = movie("/m/old.mkv", "Old", None);
        old.date_added = Utc::now() - Duration::days(3);
        let new = movie("/m/new.mkv", "New", None);
        let collection = LibraryCollection::new(store_with(&[old, new]));

        let items = collection.items(&CollectionFilter::default()).unwrap();
        assert_eq!(items[0].title, "New");
    }

    #[test]
    fn test_all_and_display_names() {
        let mut show = LibraryItem::new("/tv/Show S01E01.mkv", MediaKind::TvShow, "Show");
        show.genres = vec!["Drama".into()];
        let collection = LibraryCollection::new(store_with(&[
            movie("/m/a.mkv", "A", Some(2001)),
            show,
        ]));

        let all = collection
            .items(&CollectionFilter::default().media_type("all").genre("All"))
            .unwrap();
        assert_eq!(all.len(), 2);

        let shows = collection
            .items(&CollectionFilter::default().media_type("TV Shows"))
            .unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].title, "Show");

        let drama = collection
            .items(&CollectionFilter::default().genre("Drama"))
            .unwrap();
        assert_eq!(drama.len(), 1);

        assert!(collection
            .items(&CollectionFilter::default().media_type("podcasts"))
            .is_err());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let collection = LibraryCollection::new(store_with(&[
            movie("/m/1.mkv", "The Matrix Reloaded", Some(2003)),
            movie("/m/2.mkv", "Heat", Some(1995)),
        ]));
        let hits = collection
            .items(&CollectionFilter::default().search("MATRIX"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "The Matrix Reloaded");
    }

    #[test]
    fn test_pagination_after_sort() {
        let collection = LibraryCollection::new(store_with(&[
            movie("/m/1.mkv", "A", Some(1990)),
            movie("/m/2.mkv", "B", Some(1991)),
            movie("/m/3.mkv", "C", Some(1992)),
        ]));
        let page = collection
            .items(&CollectionFilter::default().sorter("year").offset(1).limit(1))
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].year, Some(1991));

        let past_end = collection
            .items(&CollectionFilter::default().offset(10))
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_display_shape() {
        let mut item = movie("/media/Heat.1995.mkv", "Heat", Some(1995));
        item.rating = Some(8.26);
        item.file_size = 734_003_200;
        item.backdrop_url = Some("https://img/backdrop.jpg".into());
        item.external_id = Some("tt0113277".into());

        let display = DisplayItem::from(&item);
        assert_eq!(display.imdb_id, "tt0113277");
        assert_eq!(display.rating.percentage, 83);
        assert_eq!(display.runtime, 0);
        assert_eq!(display.images.fanart, display.images.banner);
        assert_eq!(display.torrents.local.url, "file:///media/Heat.1995.mkv");
        assert_eq!(display.torrents.local.size, "700.00 MB");

        let json = serde_json::to_value(&display).unwrap();
        assert_eq!(json["media_type"], "movie");
        assert_eq!(json["torrents"]["local"]["seed"], 0);
    }

    #[test]
    fn test_display_defaults_for_unmatched_item() {
        let item = movie("/media/home.mkv", "home", None);
        let display = DisplayItem::from(&item);
        assert_eq!(display.imdb_id, format!("local_{}", item.id));
        assert_eq!(display.rating.percentage, 50);
        assert_eq!(display.images.poster, None);
    }
}
