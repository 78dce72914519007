//! Catalog item queries.
//!
//! Items are keyed by `file_path`. An upsert of a path that is already
//! cataloged rewrites the scanned fields only; `id`, `play_count`,
//! `last_played` and `date_added` keep their stored values.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use reelshelf_common::{Error, ItemId, MediaKind, Result};

use super::{conversion_error, optional_timestamp, parsed, timestamp};
use crate::models::{LibraryItem, LibraryStats, MetadataPatch};

const ITEM_COLUMNS: &str = "id, file_path, file_size, media_type, title, year, season, episode,
    external_id, poster_url, backdrop_url, genres, rating, synopsis, last_modified,
    last_played, play_count, date_added, original_filename";

/// Filter options for listing items.
///
/// `genre` must match one of the item's genres exactly; `search` is a
/// case-insensitive substring match on the title.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub media_type: Option<MediaKind>,
    pub genre: Option<String>,
    pub search: Option<String>,
}

/// Insert an item, or merge it into the row already holding its path.
pub fn upsert_item(conn: &Connection, item: &LibraryItem) -> Result<()> {
    let genres_json =
        serde_json::to_string(&item.genres).map_err(|e| Error::internal(e.to_string()))?;
    let file_size = i64::try_from(item.file_size).unwrap_or(i64::MAX);

    conn.execute(
        "INSERT INTO library_items (
            id, file_path, file_size, media_type, title, year, season, episode,
            external_id, poster_url, backdrop_url, genres, rating, synopsis,
            last_modified, last_played, play_count, date_added, original_filename
         ) VALUES (
            :id, :file_path, :file_size, :media_type, :title, :year, :season, :episode,
            :external_id, :poster_url, :backdrop_url, :genres, :rating, :synopsis,
            :last_modified, :last_played, :play_count, :date_added, :original_filename
         )
         ON CONFLICT(file_path) DO UPDATE SET
            file_size = excluded.file_size,
            media_type = excluded.media_type,
            title = excluded.title,
            year = excluded.year,
            season = excluded.season,
            episode = excluded.episode,
            external_id = excluded.external_id,
            poster_url = excluded.poster_url,
            backdrop_url = excluded.backdrop_url,
            genres = excluded.genres,
            rating = excluded.rating,
            synopsis = excluded.synopsis,
            last_modified = excluded.last_modified,
            original_filename = excluded.original_filename",
        rusqlite::named_params! {
            ":id": item.id.to_string(),
            ":file_path": &item.file_path,
            ":file_size": file_size,
            ":media_type": item.media_type.as_str(),
            ":title": &item.title,
            ":year": item.year,
            ":season": item.season,
            ":episode": item.episode,
            ":external_id": &item.external_id,
            ":poster_url": &item.poster_url,
            ":backdrop_url": &item.backdrop_url,
            ":genres": genres_json,
            ":rating": item.rating,
            ":synopsis": &item.synopsis,
            ":last_modified": item.last_modified.to_rfc3339(),
            ":last_played": item.last_played.map(|dt| dt.to_rfc3339()),
            ":play_count": item.play_count,
            ":date_added": item.date_added.to_rfc3339(),
            ":original_filename": &item.original_filename,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Parse an item from a database row selected with `ITEM_COLUMNS`.
fn parse_item_row(row: &rusqlite::Row) -> rusqlite::Result<LibraryItem> {
    let genres_json: String = row.get(11)?;
    let file_size: i64 = row.get(2)?;

    Ok(LibraryItem {
        id: parsed(row, 0)?,
        file_path: row.get(1)?,
        file_size: u64::try_from(file_size).unwrap_or(0),
        media_type: parsed(row, 3)?,
        title: row.get(4)?,
        year: row.get(5)?,
        season: row.get(6)?,
        episode: row.get(7)?,
        external_id: row.get(8)?,
        poster_url: row.get(9)?,
        backdrop_url: row.get(10)?,
        genres: serde_json::from_str(&genres_json).map_err(|e| conversion_error(11, e))?,
        rating: row.get(12)?,
        synopsis: row.get(13)?,
        last_modified: timestamp(row, 14)?,
        last_played: optional_timestamp(row, 15)?,
        play_count: row.get(16)?,
        date_added: timestamp(row, 17)?,
        original_filename: row.get(18)?,
    })
}

/// Get an item by ID.
pub fn get_item(conn: &Connection, id: ItemId) -> Result<Option<LibraryItem>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM library_items WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_item_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get an item by file path.
pub fn get_item_by_path(conn: &Connection, path: &str) -> Result<Option<LibraryItem>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM library_items WHERE file_path = :path"),
        rusqlite::named_params! { ":path": path },
        parse_item_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List items matching `filter`, ordered by file path.
pub fn list_items(conn: &Connection, filter: &ItemFilter) -> Result<Vec<LibraryItem>> {
    let mut sql = format!("SELECT {ITEM_COLUMNS} FROM library_items WHERE 1=1");
    if filter.media_type.is_some() {
        sql.push_str(" AND media_type = :media_type");
    }
    if filter.genre.is_some() {
        sql.push_str(" AND EXISTS (SELECT 1 FROM json_each(genres) WHERE json_each.value = :genre)");
    }
    sql.push_str(" ORDER BY file_path");

    let media_type = filter.media_type.map(|kind| kind.as_str());
    let mut params: Vec<(&str, &dyn rusqlite::ToSql)> = Vec::new();
    if let Some(kind) = media_type.as_ref() {
        params.push((":media_type", kind));
    }
    if let Some(genre) = filter.genre.as_ref() {
        params.push((":genre", genre));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;
    let items = stmt
        .query_map(params.as_slice(), parse_item_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(match filter.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            let needle = term.to_lowercase();
            items
                .into_iter()
                .filter(|item| item.title.to_lowercase().contains(&needle))
                .collect()
        }
        _ => items,
    })
}

/// Count all items.
pub fn count_items(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM library_items", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|count| u64::try_from(count).unwrap_or(0))
    .map_err(|e| Error::database(e.to_string()))
}

/// Every stored `(id, file_path)` pair.
pub fn list_paths(conn: &Connection) -> Result<Vec<(ItemId, String)>> {
    let mut stmt = conn
        .prepare("SELECT id, file_path FROM library_items ORDER BY file_path")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((parsed(row, 0)?, row.get(1)?)))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete an item by ID.
///
/// Returns `true` if a row was removed.
pub fn delete_item(conn: &Connection, id: ItemId) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM library_items WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

/// Delete a batch of items in one transaction.
pub fn delete_items(conn: &Connection, ids: &[ItemId]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let mut removed = 0;
    {
        let mut stmt = tx
            .prepare("DELETE FROM library_items WHERE id = ?")
            .map_err(|e| Error::database(e.to_string()))?;
        for id in ids {
            removed += stmt
                .execute([id.to_string()])
                .map_err(|e| Error::database(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(removed)
}

/// Delete every item. Returns the number removed.
pub fn delete_all_items(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM library_items", [])
        .map_err(|e| Error::database(e.to_string()))
}

/// Bump the play count and stamp `last_played`.
pub fn record_playback(conn: &Connection, id: ItemId, at: DateTime<Utc>) -> Result<bool> {
    let rows = conn
        .execute(
            "UPDATE library_items
             SET play_count = play_count + 1, last_played = :at
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":at": at.to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

/// Apply `patch` to the item with `id`.
///
/// Returns `true` if the item exists.
pub fn update_metadata(conn: &Connection, id: ItemId, patch: &MetadataPatch) -> Result<bool> {
    let genres_json = patch
        .genres
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::internal(e.to_string()))?;

    let rows = conn
        .execute(
            "UPDATE library_items SET
                title = COALESCE(:title, title),
                year = COALESCE(:year, year),
                external_id = COALESCE(:external_id, external_id),
                poster_url = COALESCE(:poster_url, poster_url),
                backdrop_url = COALESCE(:backdrop_url, backdrop_url),
                genres = COALESCE(:genres, genres),
                rating = COALESCE(:rating, rating),
                synopsis = COALESCE(:synopsis, synopsis)
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":title": &patch.title,
                ":year": patch.year,
                ":external_id": &patch.external_id,
                ":poster_url": &patch.poster_url,
                ":backdrop_url": &patch.backdrop_url,
                ":genres": genres_json,
                ":rating": patch.rating,
                ":synopsis": &patch.synopsis,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

/// Distinct genres, sorted, optionally restricted to one media kind.
pub fn list_genres(conn: &Connection, media_type: Option<MediaKind>) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT json_each.value
             FROM library_items, json_each(library_items.genres)
             WHERE :media_type IS NULL OR library_items.media_type = :media_type
             ORDER BY json_each.value",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let genres = stmt
        .query_map(
            rusqlite::named_params! { ":media_type": media_type.map(|kind| kind.as_str()) },
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(genres)
}

/// Item counts grouped by media kind.
pub fn stats(conn: &Connection) -> Result<LibraryStats> {
    let mut stmt = conn
        .prepare("SELECT media_type, COUNT(*) FROM library_items GROUP BY media_type")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((parsed::<MediaKind>(row, 0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| Error::database(e.to_string()))?;

    let mut stats = LibraryStats::default();
    for row in rows {
        let (kind, count) = row.map_err(|e| Error::database(e.to_string()))?;
        let count = u64::try_from(count).unwrap_or(0);
        match kind {
            MediaKind::Movie => stats.movies = count,
            MediaKind::TvShow => stats.tv_shows = count,
            MediaKind::Other => stats.other = count,
        }
        stats.total += count;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use chrono::TimeZone;

    fn movie(path: &str, title: &str, genres: &[&str]) -> LibraryItem {
        let mut item = LibraryItem::new(path, MediaKind::Movie, title);
        item.genres = genres.iter().map(|g| g.to_string()).collect();
        item
    }

    #[test]
    fn test_upsert_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut item = movie("/m/Heat.1995.mkv", "Heat", &["Crime", "Thriller"]);
        item.year = Some(1995);
        item.rating = Some(8.3);
        item.file_size = 1_500_000_000;
        upsert_item(&conn, &item).unwrap();

        let stored = get_item(&conn, item.id).unwrap().unwrap();
        assert_eq!(stored.title, "Heat");
        assert_eq!(stored.year, Some(1995));
        assert_eq!(stored.genres, vec!["Crime", "Thriller"]);
        assert_eq!(stored.file_size, 1_500_000_000);
        assert_eq!(stored.original_filename, "Heat.1995.mkv");

        let by_path = get_item_by_path(&conn, "/m/Heat.1995.mkv").unwrap().unwrap();
        assert_eq!(by_path.id, item.id);
    }

    #[test]
    fn test_upsert_same_path_preserves_play_data() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = movie("/m/Heat.mkv", "Heat", &[]);
        upsert_item(&conn, &first).unwrap();
        let played_at = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        assert!(record_playback(&conn, first.id, played_at).unwrap());
        assert!(record_playback(&conn, first.id, played_at).unwrap());

        // A rescan builds a brand-new item value for the same path
        let mut rescanned = movie("/m/Heat.mkv", "Heat", &["Crime"]);
        rescanned.synopsis = Some("A heist.".into());
        upsert_item(&conn, &rescanned).unwrap();

        assert_eq!(count_items(&conn).unwrap(), 1);
        let stored = get_item_by_path(&conn, "/m/Heat.mkv").unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.play_count, 2);
        assert_eq!(stored.last_played, Some(played_at));
        assert_eq!(stored.date_added, first.date_added);
        assert_eq!(stored.genres, vec!["Crime"]);
        assert_eq!(stored.synopsis.as_deref(), Some("A heist."));
    }

    #[test]
    fn test_update_metadata_patches_only_given_fields() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut item = movie("/m/Heat.mkv", "Heat", &["Crime"]);
        item.year = Some(1995);
        item.synopsis = Some("A heist.".into());
        upsert_item(&conn, &item).unwrap();
        let played_at = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        record_playback(&conn, item.id, played_at).unwrap();

        let patch = MetadataPatch {
            external_id: Some("tt0113277".into()),
            genres: Some(vec!["Crime".into(), "Drama".into()]),
            rating: Some(8.3),
            ..Default::default()
        };
        assert!(update_metadata(&conn, item.id, &patch).unwrap());

        let stored = get_item(&conn, item.id).unwrap().unwrap();
        assert_eq!(stored.title, "Heat");
        assert_eq!(stored.year, Some(1995));
        assert_eq!(stored.synopsis.as_deref(), Some("A heist."));
        assert_eq!(stored.external_id.as_deref(), Some("tt0113277"));
        assert_eq!(stored.genres, vec!["Crime", "Drama"]);
        assert_eq!(stored.rating, Some(8.3));
        assert_eq!(stored.play_count, 1);
        assert_eq!(stored.last_played, Some(played_at));
        assert_eq!(stored.file_path, "/m/Heat.mkv");
    }

    #[test]
    fn test_update_metadata_unknown_item() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let patch = MetadataPatch {
            title: Some("Nothing".into()),
            ..Default::default()
        };
        assert!(!update_metadata(&conn, ItemId::new(), &patch).unwrap());
        assert_eq!(count_items(&conn).unwrap(), 0);
    }

    #[test]
    fn test_list_items_filters() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_item(&conn, &movie("/m/a.mkv", "Heat", &["Crime"])).unwrap();
        upsert_item(&conn, &movie("/m/b.mkv", "Ronin", &["Action"])).unwrap();
        let mut episode = LibraryItem::new("/tv/c.mkv", MediaKind::TvShow, "Heat Wave");
        episode.genres = vec!["Crime".into()];
        upsert_item(&conn, &episode).unwrap();

        let all = list_items(&conn, &ItemFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let movies = list_items(
            &conn,
            &ItemFilter {
                media_type: Some(MediaKind::Movie),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(movies.len(), 2);

        let crime = list_items(
            &conn,
            &ItemFilter {
                genre: Some("Crime".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(crime.len(), 2);

        let search = list_items(
            &conn,
            &ItemFilter {
                search: Some("HEAT".into()),
                media_type: Some(MediaKind::TvShow),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].title, "Heat Wave");
    }

    #[test]
    fn test_delete_and_clear() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let a = movie("/m/a.mkv", "A", &[]);
        let b = movie("/m/b.mkv", "B", &[]);
        let c = movie("/m/c.mkv", "C", &[]);
        for item in [&a, &b, &c] {
            upsert_item(&conn, item).unwrap();
        }

        assert!(delete_item(&conn, a.id).unwrap());
        assert!(!delete_item(&conn, a.id).unwrap());
        assert_eq!(delete_items(&conn, &[b.id, ItemId::new()]).unwrap(), 1);
        assert_eq!(list_paths(&conn).unwrap(), vec![(c.id, "/m/c.mkv".to_string())]);
        assert_eq!(delete_all_items(&conn).unwrap(), 1);
        assert_eq!(count_items(&conn).unwrap(), 0);
    }

    #[test]
    fn test_genres_and_stats() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_item(&conn, &movie("/m/a.mkv", "A", &["Drama", "Crime"])).unwrap();
        upsert_item(&conn, &movie("/m/b.mkv", "B", &["Crime"])).unwrap();
        let mut episode = LibraryItem::new("/tv/c.mkv", MediaKind::TvShow, "C");
        episode.genres = vec!["Comedy".into()];
        upsert_item(&conn, &episode).unwrap();

        assert_eq!(list_genres(&conn, None).unwrap(), vec!["Comedy", "Crime", "Drama"]);
        assert_eq!(
            list_genres(&conn, Some(MediaKind::Movie)).unwrap(),
            vec!["Crime", "Drama"]
        );

        let stats = stats(&conn).unwrap();
        assert_eq!(
            stats,
            LibraryStats {
                total: 3,
                movies: 2,
                tv_shows: 1,
                other: 0,
            }
        );
    }
}
