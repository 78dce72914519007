//! Reelshelf - local media library indexer
//!
//! Walks media folders, guesses what each video file is from its name,
//! looks it up against online metadata services and keeps the result in a
//! queryable SQLite catalog.
//!
//! This library crate exposes the core functionality for the CLI and for
//! integration testing.

pub mod config;
pub mod library;
pub mod metadata;
pub mod scanner;

pub use library::{LibraryCollection, LibraryStore};
pub use metadata::MetadataResolver;
pub use scanner::LibraryScanner;
