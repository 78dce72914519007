//! Benchmarks for reelshelf-parser.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reelshelf_parser::{clean_title, parse};

const MOVIE_SAMPLES: &[&str] = &[
    "The.Matrix.Reloaded.2003.1080p.BluRay.x264-GROUP.mkv",
    "Inception.2010.2160p.UHD.BluRay.x265.HDR.DTS-HD.MA.5.1-RELEASE.mkv",
    "[YTS.MX] Heat (1995) [1080p].mp4",
    "Blade_Runner_1982_Final_Cut.avi",
];

const TV_SAMPLES: &[&str] = &[
    "Breaking Bad S01E05.mkv",
    "Game.of.Thrones.S08E06.1080p.WEB-DL.DD5.1.H.264-GoT.mkv",
    "friends.3x12.avi",
    "Lost Season 2 Episode 14.mkv",
];

fn bench_parse_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_single");

    group.bench_function("movie", |b| {
        b.iter(|| parse(black_box("The.Matrix.Reloaded.2003.1080p.BluRay.x264-GROUP.mkv")))
    });

    group.bench_function("tv_episode", |b| {
        b.iter(|| parse(black_box("Breaking Bad S01E05.mkv")))
    });

    group.bench_function("clean_title", |b| {
        b.iter(|| clean_title(black_box("[YTS.MX] Heat (1080p x264) WEB-DL-GROUP")))
    });

    group.finish();
}

fn bench_parse_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_batch");
    let samples: Vec<&str> = MOVIE_SAMPLES.iter().chain(TV_SAMPLES).copied().collect();
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("mixed", |b| {
        b.iter(|| {
            for sample in &samples {
                black_box(parse(*sample));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse_single, bench_parse_batch);
criterion_main!(benches);
