//! Media identification using reelshelf-parser.
//!
//! Turns a file path into a parsed identity, and a parsed identity plus
//! resolved metadata into the catalog record stored for that path.

use std::path::Path;

use chrono::{DateTime, Utc};
use reelshelf_common::paths::catalog_key;
use reelshelf_db::models::LibraryItem;
use reelshelf_parser::{ParsedFilename, Parser};

use crate::metadata::{Identity, MetadataRecord};

/// Media identifier that parses file names.
#[derive(Debug, Default)]
pub struct MediaIdentifier {
    parser: Parser,
}

/// Identification result from parsing a filename.
#[derive(Debug, Clone)]
pub struct Identification {
    /// The full parser output.
    pub parsed: ParsedFilename,
    /// Identity handed to metadata lookup.
    pub identity: Identity,
}

impl Identification {
    /// Movies and TV shows are indexed; everything else is skipped.
    pub fn is_candidate(&self) -> bool {
        self.identity.kind.is_candidate()
    }
}

/// On-disk facts recorded with each item.
#[derive(Debug, Clone, Copy)]
pub struct FileFacts {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileFacts {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl MediaIdentifier {
    pub fn new(parser: Parser) -> Self {
        Self { parser }
    }

    /// Parse the file name of `path`.
    pub fn identify(&self, path: &Path) -> Identification {
        let file_name = path.file_name().map(|name| name.to_string_lossy());
        self.identify_name(file_name.as_deref().unwrap_or_default())
    }

    /// Parse a bare file name.
    pub fn identify_name(&self, file_name: &str) -> Identification {
        let parsed = self.parser.parse(file_name);
        Identification {
            identity: Identity::from(&parsed),
            parsed,
        }
    }
}

/// The catalog record for `path`.
///
/// Resolved metadata wins over the parsed title and year; season and episode
/// always come from the file name.
pub fn catalog_item(
    path: &Path,
    identification: &Identification,
    facts: FileFacts,
    metadata: Option<&MetadataRecord>,
) -> LibraryItem {
    let identity = &identification.identity;
    let mut item = LibraryItem::new(catalog_key(path), identity.kind, identity.title.clone());
    item.file_size = facts.size;
    item.last_modified = facts.modified;
    item.year = identity.year;
    item.season = identity.season;
    item.episode = identity.episode;
    item.original_filename = identification.parsed.original_filename.clone();

    if let Some(record) = metadata {
        if !record.title.trim().is_empty() {
            item.title = record.title.clone();
        }
        item.year = record.year.or(identity.year);
        item.external_id = record.external_id.clone();
        item.poster_url = record.poster_url.clone();
        item.backdrop_url = record.backdrop_url.clone();
        item.genres = record.genres.clone();
        item.rating = record.rating;
        item.synopsis = record.synopsis.clone();
    }
    item
}
