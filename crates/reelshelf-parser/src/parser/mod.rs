//! Filename classification and extraction.

mod episode;
mod title;

pub use episode::{MAX_EPISODE, MAX_SEASON};
pub use title::clean_title;

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParserConfig;
use crate::model::{MediaType, ParsedFilename};
use episode::EpisodeScan;
use title::clean_fragment;

/// Extensions stripped from the end of a filename.
const KNOWN_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ogv", "ts",
    "m2ts", "vob", "iso", "divx", "rmvb", "srt", "sub", "ass", "ssa", "vtt", "nfo",
];

/// A leading `[Group]` tag.
static RE_LEADING_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\[[^\]]*\]").unwrap());

static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Characters dropped from the end of a title fragment before cleaning.
fn is_fragment_tail(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | '[' | '{' | '-' | '_' | '.' | ',')
}

pub(crate) fn parse_with_config(input: Option<&str>, config: &ParserConfig) -> ParsedFilename {
    let original = input.unwrap_or_default();
    let base = base_name(original);
    if base.trim().is_empty() {
        return ParsedFilename::unknown(original);
    }

    let name = strip_leading_tag(base);

    match episode::scan(name) {
        EpisodeScan::Found(marker) => {
            let (title, year) = split_show_title(&name[..marker.start], config);
            ParsedFilename {
                media_type: MediaType::TvShow,
                title,
                year,
                season: Some(marker.season),
                episode: Some(marker.episode),
                original_filename: original.to_string(),
            }
        }
        EpisodeScan::Unparsable => other(name, original),
        EpisodeScan::Absent => match movie_title_and_year(name, config) {
            Some((title, year)) => ParsedFilename {
                media_type: MediaType::Movie,
                title,
                year: Some(year),
                season: None,
                episode: None,
                original_filename: original.to_string(),
            },
            None => other(name, original),
        },
    }
}

/// Raw classification, before extraction.
pub(crate) fn classify(filename: &str, config: &ParserConfig) -> MediaType {
    let name = strip_leading_tag(base_name(filename));
    if episode::is_shaped(name) {
        MediaType::TvShow
    } else if !year_tokens(name, config).is_empty() {
        MediaType::Movie
    } else {
        MediaType::Other
    }
}

pub(crate) fn is_tv_show(filename: &str) -> bool {
    episode::is_shaped(strip_leading_tag(base_name(filename)))
}

pub(crate) fn has_year(filename: &str, config: &ParserConfig) -> bool {
    !year_tokens(base_name(filename), config).is_empty()
}

fn other(name: &str, original: &str) -> ParsedFilename {
    ParsedFilename {
        media_type: MediaType::Other,
        title: clean_title(name),
        year: None,
        season: None,
        episode: None,
        original_filename: original.to_string(),
    }
}

/// Drop directories and a known extension.
fn base_name(filename: &str) -> &str {
    let file = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match file.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && KNOWN_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => file,
    }
}

fn strip_leading_tag(name: &str) -> &str {
    match RE_LEADING_TAG.find(name) {
        Some(tag) if !name[tag.end()..].trim().is_empty() => &name[tag.end()..],
        _ => name,
    }
}

/// Four-digit numbers inside the accepted year window, with their offsets.
fn year_tokens(name: &str, config: &ParserConfig) -> Vec<(usize, u16)> {
    RE_DIGITS
        .find_iter(name)
        .filter(|m| m.len() == 4)
        .filter_map(|m| m.as_str().parse::<u16>().ok().map(|year| (m.start(), year)))
        .filter(|(_, year)| config.accepts_year(*year))
        .collect()
}

/// The first year with a usable title in front of it wins. A name that is
/// nothing but a year (`2012.mkv`) keeps the year as its title.
fn movie_title_and_year(name: &str, config: &ParserConfig) -> Option<(String, u16)> {
    let years = year_tokens(name, config);
    let &(_, first_year) = years.first()?;

    for &(start, year) in &years {
        let prefix = name[..start].trim_end_matches(is_fragment_tail);
        if let Some(title) = clean_fragment(prefix) {
            return Some((title, year));
        }
    }
    Some((clean_title(name), first_year))
}

/// Title in front of a TV marker, splitting off a trailing air year
/// (`Doctor Who (2005)`) unless the year is the whole title.
fn split_show_title(prefix: &str, config: &ParserConfig) -> (String, Option<u16>) {
    let cleaned = clean_title(prefix.trim_end_matches(is_fragment_tail));

    if let Some((head, last)) = cleaned.rsplit_once(' ') {
        let bare = last.trim_start_matches('(').trim_end_matches(')');
        if bare.len() == 4 {
            if let Ok(year) = bare.parse::<u16>() {
                if config.accepts_year(year) {
                    if let Some(title) = clean_fragment(head) {
                        return (title, Some(year));
                    }
                }
            }
        }
    }
    (cleaned, None)
}
