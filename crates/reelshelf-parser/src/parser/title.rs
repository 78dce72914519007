//! Title cleaning.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexer::is_noise_word;
use crate::model::ParsedFilename;

/// `[...]` and `{...}` groups are always release tags.
static RE_TAG_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]|\{[^{}]*\}").unwrap());

/// Innermost `(...)` groups; removed only when they hold nothing but noise.
static RE_PAREN_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^()]*)\)").unwrap());

/// Clean a raw title fragment.
///
/// Dots and underscores become spaces, bracketed release tags and noise words
/// are dropped, whitespace is collapsed and stray hyphens are trimmed from the
/// ends. The result is a fixed point: cleaning it again changes nothing.
/// Returns `"Unknown"` when nothing survives.
///
/// # Examples
///
/// ```
/// use reelshelf_parser::clean_title;
///
/// assert_eq!(clean_title("The.Matrix.Reloaded."), "The Matrix Reloaded");
/// assert_eq!(clean_title("Movie 1080p x264-GROUP"), "Movie");
/// assert_eq!(clean_title("720p"), "Unknown");
/// ```
pub fn clean_title(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current.is_empty() {
        ParsedFilename::UNKNOWN_TITLE.to_string()
    } else {
        current
    }
}

/// Like [`clean_title`] but yields `None` instead of the "Unknown" fallback.
pub(crate) fn clean_fragment(raw: &str) -> Option<String> {
    let cleaned = clean_title(raw);
    // "Unknown" only survives cleaning when it was the literal input
    if cleaned == ParsedFilename::UNKNOWN_TITLE && !raw.contains(ParsedFilename::UNKNOWN_TITLE) {
        None
    } else {
        Some(cleaned)
    }
}

fn clean_pass(input: &str) -> String {
    let spaced = input.replace(['.', '_'], " ");

    let mut text = spaced;
    loop {
        let stripped = RE_TAG_GROUP.replace_all(&text, " ").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    loop {
        let stripped = RE_PAREN_GROUP
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let inner = &caps[1];
                if inner.split_whitespace().all(is_noise_word) {
                    " ".to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|word| !is_noise_word(word))
        .collect();

    words
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_and_underscores() {
        assert_eq!(clean_title("The_Big.Lebowski"), "The Big Lebowski");
    }

    #[test]
    fn test_strips_noise_tokens() {
        assert_eq!(
            clean_title("Inception 2160p UHD BluRay x265 10bit"),
            "Inception"
        );
        assert_eq!(clean_title("Movie WEB-DL DDP5 1 Atmos"), "Movie 1");
    }

    #[test]
    fn test_strips_release_tags() {
        assert_eq!(clean_title("[YTS.MX] Heat [1080p]"), "Heat");
        assert_eq!(clean_title("Heat {imdb-tt0113277}"), "Heat");
        assert_eq!(clean_title("Heat (1080p x264)"), "Heat");
    }

    #[test]
    fn test_keeps_meaningful_parentheses() {
        assert_eq!(clean_title("Blade Runner (Final Cut)"), "Blade Runner (Final Cut)");
        assert_eq!(clean_title("Doctor Who (2005)"), "Doctor Who (2005)");
    }

    #[test]
    fn test_keeps_hyphenated_title_words() {
        assert_eq!(clean_title("Spider-Man Homecoming"), "Spider-Man Homecoming");
    }

    #[test]
    fn test_trims_separators() {
        assert_eq!(clean_title("  Doctor Who - "), "Doctor Who");
        assert_eq!(clean_title("-x264 Movie"), "Movie");
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(clean_title(""), "Unknown");
        assert_eq!(clean_title(" . _ - "), "Unknown");
        assert_eq!(clean_title("[group]"), "Unknown");
    }

    #[test]
    fn test_idempotent_on_tricky_input() {
        let samples = [
            "((720p))",
            "[[x]]",
            "- x264 -",
            "a.b_c - [d] (e) {f}",
            "Unknown",
            "(Movie  x264 )",
            "...",
            "Ünïcödé.Tïtlé.x265",
        ];
        for sample in samples {
            let once = clean_title(sample);
            assert_eq!(clean_title(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_clean_fragment_distinguishes_empty() {
        assert_eq!(clean_fragment("1080p"), None);
        assert_eq!(clean_fragment("Unknown Soldier"), Some("Unknown Soldier".into()));
        assert_eq!(clean_fragment("Unknown"), Some("Unknown".into()));
    }
}
