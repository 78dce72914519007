//! Title normalization and candidate scoring.

use std::collections::HashSet;

/// Search candidates scoring below this are treated as a miss.
pub const MIN_CONFIDENCE: f64 = 0.3;

/// Case-fold, spell out `&`, turn punctuation into spaces and collapse runs
/// of whitespace.
pub fn normalize(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c == '&' {
            out.push_str(" and ");
        } else if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How well `candidate_title`/`candidate_year` matches the query, in `0.0..=0.8`.
///
/// Titles are compared after [`normalize`]: an exact match scores 0.5, a
/// candidate containing every query word 0.3, otherwise word overlap scaled
/// to at most 0.25. A matching year adds 0.3, a year off by one adds 0.15.
pub fn confidence(
    query_title: &str,
    candidate_title: &str,
    query_year: Option<u16>,
    candidate_year: Option<u16>,
) -> f64 {
    let query = normalize(query_title);
    let candidate = normalize(candidate_title);
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let base = if query == candidate {
        0.5
    } else {
        let query_words: HashSet<&str> = query.split(' ').collect();
        let candidate_words: HashSet<&str> = candidate.split(' ').collect();
        if query_words.is_subset(&candidate_words) {
            0.3
        } else {
            let shared = query_words.intersection(&candidate_words).count() as f64;
            let total = query_words.union(&candidate_words).count() as f64;
            0.25 * shared / total
        }
    };

    let year_bonus = match (query_year, candidate_year) {
        (Some(q), Some(c)) if q == c => 0.3,
        (Some(q), Some(c)) if q.abs_diff(c) <= 1 => 0.15,
        _ => 0.0,
    };

    base + year_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Spider-Man: Homecoming"), "spider man homecoming");
        assert_eq!(normalize("Law & Order"), "law and order");
        assert_eq!(normalize("  The   Office (US) "), "the office us");
        assert_eq!(normalize("AMÉLIE"), "amélie");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_exact_title_and_year() {
        assert!(approx(confidence("Inception", "Inception", Some(2010), Some(2010)), 0.8));
    }

    #[test]
    fn test_punctuation_insensitive() {
        assert!(approx(
            confidence("Spider Man Homecoming", "Spider-Man: Homecoming", None, None),
            0.5
        ));
    }

    #[test]
    fn test_close_year() {
        assert!(approx(confidence("Dune", "Dune", Some(2021), Some(2020)), 0.65));
    }

    #[test]
    fn test_containment() {
        let score = confidence("Doctor Who", "Doctor Who (2005)", None, None);
        assert!(approx(score, 0.3));
        assert!(score >= MIN_CONFIDENCE);
    }

    #[test]
    fn test_partial_word_is_not_a_match() {
        let score = confidence("Alien", "Aliens", None, None);
        assert!(approx(score, 0.0));
        assert!(score < MIN_CONFIDENCE);
    }

    #[test]
    fn test_overlap_alone_stays_below_threshold() {
        let score = confidence("The Matrix Reloaded", "The Matrix", None, None);
        assert!(score > 0.0);
        assert!(score < MIN_CONFIDENCE);
    }

    #[test]
    fn test_empty_titles() {
        assert!(approx(confidence("", "Heat", Some(1995), Some(1995)), 0.0));
    }
}
