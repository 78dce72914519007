//! Integration tests for catalog queries over a file-backed store.

use reelshelf::library::{CollectionFilter, LibraryCollection, LibraryStore};
use reelshelf_common::MediaKind;
use reelshelf_db::models::LibraryItem;

fn movie(path: &str, title: &str, year: u16) -> LibraryItem {
    let mut item = LibraryItem::new(path, MediaKind::Movie, title);
    item.year = Some(year);
    item
}

#[test]
fn newest_movies_first_with_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = LibraryStore::open(&dir.path().join("library.db")).unwrap();
    store.upsert(&movie("/m/a.mkv", "Fight Club", 1999)).unwrap();
    store.upsert(&movie("/m/b.mkv", "Inception", 2010)).unwrap();
    store.upsert(&movie("/m/c.mkv", "Oldboy", 2003)).unwrap();
    store
        .upsert(&LibraryItem::new("/tv/x.mkv", MediaKind::TvShow, "Lost"))
        .unwrap();

    let collection = LibraryCollection::new(store);
    let filter = CollectionFilter::default()
        .media_type("movie")
        .sorter("year")
        .limit(2);
    let years: Vec<_> = collection
        .fetch(&filter)
        .unwrap()
        .into_iter()
        .map(|item| item.year)
        .collect();

    assert_eq!(years, vec![Some(2010), Some(2003)]);
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nested/library.db");
    {
        let store = LibraryStore::open(&db).unwrap();
        let mut item = movie("/m/heat.mkv", "Heat", 1995);
        item.genres = vec!["Crime".into(), "Thriller".into()];
        store.upsert(&item).unwrap();
        store.record_playback(item.id).unwrap();
    }

    let store = LibraryStore::open(&db).unwrap();
    let collection = LibraryCollection::new(store.clone());
    let items = collection
        .fetch(&CollectionFilter::default().genre("Crime").sorter("play count"))
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Heat");
    assert_eq!(items[0].play_count, 1);
    assert_eq!(store.genres(None).unwrap(), vec!["Crime", "Thriller"]);
}

#[test]
fn display_json_shape() {
    let store = LibraryStore::in_memory().unwrap();
    let mut item = movie("/m/heat.mkv", "Heat", 1995);
    item.external_id = Some("tt0113277".into());
    item.rating = Some(8.3);
    item.file_size = 1024 * 1024 * 700;
    store.upsert(&item).unwrap();

    let items = LibraryCollection::new(store)
        .fetch(&CollectionFilter::default())
        .unwrap();
    let json = serde_json::to_value(&items[0]).unwrap();

    assert_eq!(json["imdb_id"], "tt0113277");
    assert_eq!(json["rating"]["percentage"], 83);
    assert_eq!(json["media_type"], "movie");
    assert_eq!(json["torrents"]["local"]["size"], "700.00 MB");
    assert_eq!(json["torrents"]["local"]["url"], "file:///m/heat.mkv");
}

#[test]
fn unknown_sorter_is_an_error() {
    let store = LibraryStore::in_memory().unwrap();
    let result = LibraryCollection::new(store).fetch(&CollectionFilter::default().sorter("loudness"));
    assert!(result.is_err());
}
