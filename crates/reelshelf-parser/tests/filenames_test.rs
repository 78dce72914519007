//! Table-driven checks over realistic library filenames.

use reelshelf_parser::config::ParserConfig;
use reelshelf_parser::{clean_title, parse, MediaType, Parser};

struct Case {
    input: &'static str,
    media_type: MediaType,
    title: &'static str,
    year: Option<u16>,
    season: Option<u16>,
    episode: Option<u16>,
}

const fn movie(input: &'static str, title: &'static str, year: u16) -> Case {
    Case {
        input,
        media_type: MediaType::Movie,
        title,
        year: Some(year),
        season: None,
        episode: None,
    }
}

const fn show(
    input: &'static str,
    title: &'static str,
    year: Option<u16>,
    season: u16,
    episode: u16,
) -> Case {
    Case {
        input,
        media_type: MediaType::TvShow,
        title,
        year,
        season: Some(season),
        episode: Some(episode),
    }
}

const fn other(input: &'static str, title: &'static str) -> Case {
    Case {
        input,
        media_type: MediaType::Other,
        title,
        year: None,
        season: None,
        episode: None,
    }
}

const CASES: &[Case] = &[
    movie(
        "The.Matrix.Reloaded.2003.1080p.BluRay.x264-GROUP.mkv",
        "The Matrix Reloaded",
        2003,
    ),
    movie("Inception (2010).mp4", "Inception", 2010),
    movie("[YTS.MX] Heat (1995) [1080p].mkv", "Heat", 1995),
    movie("/mnt/films/Blade_Runner_1982_Final_Cut.avi", "Blade Runner", 1982),
    movie("1917.2019.2160p.UHD.BluRay.x265.mkv", "1917", 2019),
    movie("2012.mkv", "2012", 2012),
    movie("Nosferatu 1922.mkv", "Nosferatu", 1922),
    show("Breaking Bad S01E05.mkv", "Breaking Bad", None, 1, 5),
    show(
        "Game.of.Thrones.S08E06.1080p.WEB-DL.DD5.1.H.264-GoT.mkv",
        "Game of Thrones",
        None,
        8,
        6,
    ),
    show("Doctor.Who.2005.S01E01.Rose.mkv", "Doctor Who", Some(2005), 1, 1),
    show("The Office (2005) - S02E01.mp4", "The Office", Some(2005), 2, 1),
    show("friends.3x12.avi", "friends", None, 3, 12),
    show("Lost Season 2 Episode 14.mkv", "Lost", None, 2, 14),
    show("S01E01.mkv", "Unknown", None, 1, 1),
    show("1883.S01E03.mkv", "1883", None, 1, 3),
    other("holiday-video.mp4", "holiday-video"),
    other("IMG_2041.mov", "IMG 2041"),
    other("Show S00E00.mkv", "Show S00E00"),
    other("1080p.x264.mkv", "Unknown"),
];

fn parser() -> Parser {
    Parser::new(ParserConfig::builder().current_year(2024).build())
}

#[test]
fn test_all_cases() {
    let parser = parser();
    let mut failures = Vec::new();

    for case in CASES {
        let result = parser.parse(case.input);
        let actual = (
            result.media_type,
            result.title.as_str(),
            result.year,
            result.season,
            result.episode,
        );
        let expected = (
            case.media_type,
            case.title,
            case.year,
            case.season,
            case.episode,
        );
        if actual != expected {
            failures.push(format!("{}: expected {expected:?}, got {actual:?}", case.input));
        }
        assert_eq!(result.original_filename, case.input);
    }

    assert!(failures.is_empty(), "failures:\n{}", failures.join("\n"));
}

#[test]
fn test_episode_markers_beat_embedded_years() {
    let parser = parser();
    let years = [1999, 2003, 2010, 2019, 2024];
    for season in [1u16, 2, 9, 10, 42, 99] {
        for episode in [1u16, 5, 10, 23, 99] {
            for year in years {
                let name = format!("Some.Show.{year}.S{season:02}E{episode:02}.{year}.720p.mkv");
                let result = parser.parse(name.as_str());
                assert_eq!(result.media_type, MediaType::TvShow, "{name}");
                assert_eq!(result.season, Some(season), "{name}");
                assert_eq!(result.episode, Some(episode), "{name}");
            }
        }
    }
}

#[test]
fn test_tv_results_always_carry_numbers() {
    let inputs = [
        "Show S01E01",
        "Show 1x01",
        "Show Season 3 Episode 7",
        "Show S00E05",
        "Show S05E00",
        "Show 0x00",
        "Show Season 0 Episode 0",
    ];
    for input in inputs {
        let result = parse(input);
        match result.media_type {
            MediaType::TvShow => {
                assert!(result.season.unwrap() >= 1, "{input}");
                assert!(result.episode.unwrap() >= 1, "{input}");
            }
            _ => {
                assert_eq!(result.season, None, "{input}");
                assert_eq!(result.episode, None, "{input}");
            }
        }
    }
}

#[test]
fn test_title_never_empty() {
    let inputs = [
        "", " ", ".", "..mkv", "[]", "[group].mkv", "-", "720p", "S01E01", "(2019)", "___",
    ];
    for input in inputs {
        let result = parse(input);
        assert!(!result.title.trim().is_empty(), "{input:?}");
    }
}

#[test]
fn test_clean_title_is_idempotent() {
    let inputs = [
        "The.Matrix.Reloaded.2003.1080p.BluRay.x264-GROUP",
        "[YTS.MX] Heat (1995) [1080p]",
        "  lots   of    space  ",
        "- -x264- -",
        "(((1080p)))",
        "[a[b]c]",
        "{x264}.{720p}",
        "Movie (Director's Cut) (x264)",
        "Ünïcödé_Tïtlé-GRP",
        "a-b-c-d",
        "x264-x265-GROUP",
        "Unknown",
        "",
        "\t\n",
        "WEB-DL",
        "Show - - S01E01 -",
    ];
    for input in inputs {
        let once = clean_title(input);
        let twice = clean_title(&once);
        assert_eq!(once, twice, "clean_title not idempotent for {input:?}");
    }
}

#[test]
fn test_current_year_bounds_movies() {
    let strict = Parser::new(ParserConfig::builder().current_year(2000).build());
    let result = strict.parse("Avatar.2009.mkv");
    assert_eq!(result.media_type, MediaType::Other);

    let lenient = Parser::new(ParserConfig::builder().current_year(2010).build());
    assert_eq!(lenient.parse("Avatar.2009.mkv").year, Some(2009));
}
