//! Season/episode marker detection.
//!
//! Patterns are tried in priority order: `S01E05`, then `1x05`, then the
//! spelled-out "Season 1 Episode 5".

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Highest season number accepted.
pub const MAX_SEASON: u16 = 99;

/// Highest episode number accepted.
pub const MAX_EPISODE: u16 = 999;

/// `S01E05`, `s1e5`, `S01.E05`, `S01E105`.
static RE_SXXEYY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s(?P<season>\d{1,2})[ ._-]?e(?:(?P<ep3>\d{3})(?:\D|$)|(?P<episode>\d{1,2}))")
        .unwrap()
});

/// `1x05`, `01x105`; a digit or letter may not precede the season so
/// resolutions like `1920x1080` never match.
static RE_NXM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9a-z])(?P<season>\d{1,2})x(?P<episode>\d{1,3})(?:\D|$)").unwrap()
});

/// `Season 1 Episode 5`, `season.02.ep.07`.
static RE_VERBOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)season[ ._-]*(?P<season>\d{1,2})[ ._-]*(?:episode|ep)[ ._-]*(?P<episode>\d{1,3})",
    )
    .unwrap()
});

/// A season/episode marker found in a base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EpisodeMarker {
    pub season: u16,
    pub episode: u16,
    /// Byte offset where the marker begins; the title lies before it.
    pub start: usize,
}

/// Outcome of scanning for TV markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EpisodeScan {
    /// A marker with in-range numbers.
    Found(EpisodeMarker),
    /// TV-shaped, but every marker had out-of-range numbers.
    Unparsable,
    /// No TV marker at all.
    Absent,
}

/// Find the highest-priority valid marker.
pub(crate) fn scan(name: &str) -> EpisodeScan {
    let mut shaped = false;

    for caps in RE_SXXEYY.captures_iter(name) {
        shaped = true;
        let episode = caps.name("ep3").or_else(|| caps.name("episode"));
        if let Some(marker) = marker_from(&caps, episode.map(|m| m.as_str()), None) {
            return EpisodeScan::Found(marker);
        }
    }

    for caps in RE_NXM.captures_iter(name) {
        shaped = true;
        let episode = caps.name("episode").map(|m| m.as_str());
        if let Some(marker) = marker_from(&caps, episode, Some("season")) {
            return EpisodeScan::Found(marker);
        }
    }

    for caps in RE_VERBOSE.captures_iter(name) {
        shaped = true;
        let episode = caps.name("episode").map(|m| m.as_str());
        if let Some(marker) = marker_from(&caps, episode, None) {
            return EpisodeScan::Found(marker);
        }
    }

    if shaped {
        EpisodeScan::Unparsable
    } else {
        EpisodeScan::Absent
    }
}

/// Whether any TV marker appears, valid or not.
pub(crate) fn is_shaped(name: &str) -> bool {
    RE_SXXEYY.is_match(name) || RE_NXM.is_match(name) || RE_VERBOSE.is_match(name)
}

/// Build a marker. `anchor` names the group that begins the marker when the
/// whole match also covers a leading boundary character.
fn marker_from(
    caps: &Captures<'_>,
    episode: Option<&str>,
    anchor: Option<&str>,
) -> Option<EpisodeMarker> {
    let season: u16 = caps.name("season")?.as_str().parse().ok()?;
    let episode: u16 = episode?.parse().ok()?;
    if !(1..=MAX_SEASON).contains(&season) || !(1..=MAX_EPISODE).contains(&episode) {
        return None;
    }
    let start = match anchor {
        Some(name) => caps.name(name)?.start(),
        None => caps.get(0)?.start(),
    };
    Some(EpisodeMarker {
        season,
        episode,
        start,
    })
}
