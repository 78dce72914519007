//! # reelshelf-parser
//!
//! Guess a structured identity from a media filename.
//!
//! Filenames are classified as a TV episode, a movie or "other", and the
//! title, year, season and episode are extracted. Parsing never fails: empty
//! or missing input yields an `Other` result titled "Unknown".
//!
//! ## Quick Start
//!
//! ```
//! use reelshelf_parser::{parse, MediaType};
//!
//! let movie = parse("The.Matrix.Reloaded.2003.1080p.BluRay.x264-GROUP.mkv");
//! assert_eq!(movie.media_type, MediaType::Movie);
//! assert_eq!(movie.title, "The Matrix Reloaded");
//! assert_eq!(movie.year, Some(2003));
//!
//! let episode = parse("Breaking Bad S01E05.mkv");
//! assert_eq!(episode.media_type, MediaType::TvShow);
//! assert_eq!((episode.season, episode.episode), (Some(1), Some(5)));
//!
//! assert_eq!(parse(None), parse(""));
//! ```
//!
//! ## Configurable Parsing
//!
//! ```
//! use reelshelf_parser::Parser;
//! use reelshelf_parser::config::ParserConfig;
//!
//! let parser = Parser::new(ParserConfig::builder().current_year(2020).build());
//! // 2024 is past the accepted window for a 2020 clock
//! assert_eq!(parser.parse("Future.Movie.2024").year, None);
//! ```
//!
//! TV markers take precedence over years: `Show.2019.S01E01` is an episode
//! whose air year is 2019, never a movie.

pub mod config;
pub mod lexer;
pub mod model;
mod parser;

pub use model::{MediaType, ParsedFilename};
pub use parser::{clean_title, MAX_EPISODE, MAX_SEASON};

use config::ParserConfig;

/// Parse a filename using default settings.
///
/// Accepts `&str` or `Option<&str>`; `None` behaves like an empty string.
///
/// # Examples
///
/// ```
/// use reelshelf_parser::{parse, MediaType};
///
/// let result = parse("/media/Heat.1995.mkv");
/// assert_eq!(result.title, "Heat");
/// assert_eq!(result.media_type, MediaType::Movie);
/// ```
pub fn parse<'a>(filename: impl Into<Option<&'a str>>) -> ParsedFilename {
    Parser::default().parse(filename)
}

/// Raw classification of a filename: TV markers first, then a year.
///
/// Unlike [`parse`], a TV-shaped name with out-of-range numbers still
/// classifies as `TvShow` here.
pub fn classify_type(filename: &str) -> MediaType {
    Parser::default().classify_type(filename)
}

/// Whether the filename carries any season/episode marker.
pub fn is_tv_show(filename: &str) -> bool {
    parser::is_tv_show(filename)
}

/// Whether the filename carries a four-digit year in the accepted window.
pub fn has_year(filename: &str) -> bool {
    Parser::default().has_year(filename)
}

/// A configurable filename parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with the given configuration.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a filename into a [`ParsedFilename`].
    pub fn parse<'a>(&self, filename: impl Into<Option<&'a str>>) -> ParsedFilename {
        parser::parse_with_config(filename.into(), &self.config)
    }

    pub fn classify_type(&self, filename: &str) -> MediaType {
        parser::classify(filename, &self.config)
    }

    pub fn has_year(&self, filename: &str) -> bool {
        parser::has_year(filename, &self.config)
    }
}
