//! Output types produced by the parser.

use std::fmt;

/// Classification of a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaType {
    Movie,
    #[cfg_attr(feature = "serde", serde(rename = "tvshow"))]
    TvShow,
    #[default]
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::TvShow => "tvshow",
            MediaType::Other => "other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured identity guessed from a filename.
///
/// A `TvShow` always carries both `season` and `episode` (each at least 1),
/// and `title` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedFilename {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u16>,
    pub episode: Option<u16>,
    pub original_filename: String,
}

impl ParsedFilename {
    /// Title used when nothing usable survives cleaning.
    pub const UNKNOWN_TITLE: &'static str = "Unknown";

    pub(crate) fn unknown(original: &str) -> Self {
        Self {
            media_type: MediaType::Other,
            title: Self::UNKNOWN_TITLE.to_string(),
            year: None,
            season: None,
            episode: None,
            original_filename: original.to_string(),
        }
    }

    /// True for movies and TV episodes, the kinds a library indexes.
    pub fn is_candidate(&self) -> bool {
        !matches!(self.media_type, MediaType::Other)
    }
}
