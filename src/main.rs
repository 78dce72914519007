mod cli;

use reelshelf::config::{self, Config};
use reelshelf::library::{CollectionFilter, LibraryCollection, LibraryStore};
use reelshelf::metadata::MetadataResolver;
use reelshelf::scanner::{LibraryScanner, ScanEvent, ScanOptions, ScanResults};
use reelshelf_common::{ItemId, MediaKind};
use reelshelf_db::models::MetadataPatch;
use reelshelf_parser::Parser as FilenameParser;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelshelf=debug,reelshelf_db=debug,reelshelf_parser=debug".to_string()
        } else {
            "reelshelf=info,reelshelf_db=warn".to_string()
        }
    });

    // Logs go to stderr so --json output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Scan { folders, json } => {
            let (config, store) = open_catalog(config_path, database)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(&config, store, folders, json))
        }
        Commands::List {
            media_type,
            genre,
            search,
            sort,
            limit,
            offset,
            json,
        } => {
            let (_, store) = open_catalog(config_path, database)?;
            let mut filter = CollectionFilter::default().limit(limit).offset(offset);
            filter.media_type = media_type;
            filter.genre = genre;
            filter.search = search;
            filter.sorter = sort;
            list(store, &filter, json)
        }
        Commands::Parse { filename, json } => parse_filename(&filename, json),
        Commands::Stats => stats(&open_catalog(config_path, database)?.1),
        Commands::Genres { media_type } => {
            genres(&open_catalog(config_path, database)?.1, media_type.as_deref())
        }
        Commands::History { limit } => history(&open_catalog(config_path, database)?.1, limit),
        Commands::Remove { id } => remove(&open_catalog(config_path, database)?.1, &id),
        Commands::Clear { yes } => clear(&open_catalog(config_path, database)?.1, yes),
        Commands::Refresh { id } => {
            let (config, store) = open_catalog(config_path, database)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(refresh(&config, store, &id))
        }
        Commands::Edit {
            id,
            title,
            year,
            genres,
            rating,
            synopsis,
            external_id,
            poster_url,
            backdrop_url,
        } => {
            let patch = MetadataPatch {
                title,
                year,
                external_id,
                poster_url,
                backdrop_url,
                genres: (!genres.is_empty()).then_some(genres),
                rating,
                synopsis,
            };
            edit(&open_catalog(config_path, database)?.1, &id, &patch)
        }
        Commands::Play { id } => play(&open_catalog(config_path, database)?.1, &id),
        Commands::CheckConfig => check_config(config_path),
        Commands::Version => {
            println!("reelshelf {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_catalog(config_path: Option<&Path>, database: Option<&Path>) -> Result<(Config, LibraryStore)> {
    let config = config::load_config_or_default(config_path)?;
    let path = match database {
        Some(path) => path.to_path_buf(),
        None => config.library.database_path(),
    };
    tracing::debug!("Opening catalog at {}", path.display());
    let store =
        LibraryStore::open(&path).with_context(|| format!("Failed to open catalog: {:?}", path))?;
    Ok((config, store))
}

fn build_scanner(config: &Config, store: LibraryStore) -> Result<LibraryScanner> {
    let resolver = MetadataResolver::from_config(config)?;
    if !resolver.has_available_providers() {
        tracing::warn!(
            "No metadata providers configured; set {} or {} to enable lookups",
            config::TMDB_API_KEY_ENV,
            config::OMDB_API_KEY_ENV
        );
    }
    Ok(LibraryScanner::new(
        store,
        Arc::new(resolver),
        ScanOptions::from_config(config),
    ))
}

async fn scan(config: &Config, store: LibraryStore, folders: Vec<PathBuf>, json: bool) -> Result<()> {
    let folders = if folders.is_empty() {
        config.library.folder_paths()
    } else {
        folders
    };

    let scanner = build_scanner(config, store)?;
    let mut handle = scanner.start_scan(folders)?;

    let interrupt = {
        let scanner = scanner.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, finishing files in flight...");
                scanner.cancel_scan();
            }
        })
    };

    while let Some(event) = handle.next_event().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event {
            ScanEvent::Started { scan_id, folders } => {
                println!("Scan {} started ({} folders)", scan_id, folders.len());
            }
            ScanEvent::Progress(progress) => {
                tracing::debug!(
                    "[{}/{}] {}",
                    progress.files_found,
                    progress.total_estimate,
                    progress.current_file
                );
            }
            ScanEvent::FileFailed(entry) => {
                let at = entry.file.or(entry.folder).unwrap_or_default();
                eprintln!("  ✗ {}: {}", at, entry.error);
            }
            ScanEvent::Finished(results) => print_results(&results),
        }
    }

    let outcome = handle.finish().await;
    interrupt.abort();
    outcome?;
    Ok(())
}

fn print_results(results: &ScanResults) {
    println!("Scan {} {}", results.scan_id, results.status);
    println!("  Found: {}", results.found);
    println!("  Matched: {}", results.matched);
    println!("  Errors: {}", results.errors.len());
    if results.lookup_failures > 0 {
        println!("  Lookup failures: {}", results.lookup_failures);
    }
    if results.removed > 0 {
        println!("  Removed: {}", results.removed);
    }
}

fn list(store: LibraryStore, filter: &CollectionFilter, json: bool) -> Result<()> {
    let collection = LibraryCollection::new(store);

    if json {
        let items = collection.fetch(filter)?;
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let items = collection.items(filter)?;
    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }
    for item in &items {
        let year = item.year.map(|y| format!(" ({y})")).unwrap_or_default();
        let episode = match (item.season, item.episode) {
            (Some(s), Some(e)) => format!(" S{s:02}E{e:02}"),
            _ => String::new(),
        };
        let rating = item.rating.map(|r| format!("  ★ {r:.1}")).unwrap_or_default();
        println!(
            "{}  [{}] {}{}{}{}",
            item.id,
            item.media_type.as_str(),
            item.title,
            year,
            episode,
            rating
        );
    }
    Ok(())
}

fn parse_filename(filename: &str, json: bool) -> Result<()> {
    let parsed = FilenameParser::default().parse(filename);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    println!("Type: {}", parsed.media_type);
    println!("Title: {}", parsed.title);
    if let Some(year) = parsed.year {
        println!("Year: {}", year);
    }
    if let Some(season) = parsed.season {
        println!("Season: {}", season);
    }
    if let Some(episode) = parsed.episode {
        println!("Episode: {}", episode);
    }
    Ok(())
}

fn stats(store: &LibraryStore) -> Result<()> {
    let stats = store.stats()?;
    println!("Items: {}", stats.total);
    println!("  {}: {}", MediaKind::Movie.display_name(), stats.movies);
    println!("  {}: {}", MediaKind::TvShow.display_name(), stats.tv_shows);
    println!("  {}: {}", MediaKind::Other.display_name(), stats.other);
    Ok(())
}

fn genres(store: &LibraryStore, media_type: Option<&str>) -> Result<()> {
    let kind = match media_type.map(str::trim) {
        Some(kind) if !kind.eq_ignore_ascii_case("all") => Some(kind.parse::<MediaKind>()?),
        _ => None,
    };
    for genre in store.genres(kind)? {
        println!("{}", genre);
    }
    Ok(())
}

fn history(store: &LibraryStore, limit: u32) -> Result<()> {
    let scans = store.scan_history(limit)?;
    if scans.is_empty() {
        println!("No scans yet.");
        return Ok(());
    }
    for scan in scans {
        println!(
            "{}  {}  {:<9}  found {}, matched {}, errors {}, removed {}",
            scan.started_at.format("%Y-%m-%d %H:%M:%S"),
            scan.id,
            scan.status.as_str(),
            scan.items_found,
            scan.items_matched,
            scan.error_count,
            scan.items_removed
        );
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<ItemId> {
    id.parse::<ItemId>()
        .with_context(|| format!("Invalid item ID: {}", id))
}

fn remove(store: &LibraryStore, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    if !store.remove(id)? {
        anyhow::bail!("No item with ID {}", id);
    }
    println!("Removed {}", id);
    Ok(())
}

fn clear(store: &LibraryStore, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("Refusing to clear the catalog without --yes");
    }
    let removed = store.clear()?;
    println!("Removed {} items", removed);
    Ok(())
}

async fn refresh(config: &Config, store: LibraryStore, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let scanner = build_scanner(config, store)?;
    let item = scanner.refresh_item(id).await?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

fn edit(store: &LibraryStore, id: &str, patch: &MetadataPatch) -> Result<()> {
    let id = parse_id(id)?;
    if patch.is_empty() {
        anyhow::bail!("Nothing to change; pass at least one field such as --title");
    }
    let item = store.update_metadata(id, patch)?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

fn play(store: &LibraryStore, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let item = store.record_playback(id)?;
    println!("{} played {} times", item.title, item.play_count);
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;
    match path {
        Some(p) => println!("✓ Configuration is valid: {:?}", p),
        None => println!("✓ Configuration is valid"),
    }
    println!("  Database: {}", config.library.database_path().display());
    println!("  Folders: {}", config.library.folders.len());
    for folder in config.library.folder_paths() {
        let marker = if folder.is_dir() { "✓" } else { "✗" };
        println!("    {} {}", marker, folder.display());
    }
    println!(
        "  Lookups: {} at a time, {}s timeout",
        config.scan.lookup_concurrency, config.scan.lookup_timeout_secs
    );
    println!(
        "  TMDB: {}",
        if config.providers.tmdb.api_key.is_some() { "configured" } else { "no API key" }
    );
    println!(
        "  OMDb: {}",
        if config.providers.omdb.api_key.is_some() { "configured" } else { "no API key" }
    );
    Ok(())
}
