//! Index build and cache restore benchmarks.
//!
//! # Benchmarks
//!
//! - `build_serial` / `build_parallel`: full bundle construction over a synthetic corpus
//! - `cache_encode`: serializing a built bundle into the cache envelope
//! - `cache_restore`: reading and verifying the cache artifact from disk
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench index_build_benchmark
//! ```

use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use postindex_core::io::cache::{self, encode_bundle};
use postindex_core::{
    IndexBuilder, PostRecord, PostStore, SymbolCatalog, SymbolEntry, ThemeCatalog,
};
use std::hint::black_box;

/// Synthetic corpus with quotes, markers, theme keywords and symbol mentions.
fn setup_corpus(size: u64) -> PostStore {
    let bodies = [
        "Dark days ahead. [Pain] >>{q}",
        "Watch the bank and the central bank >>{q} >>{q}",
        "XYZ moves again, ex-why-zee insiders [Ghost]",
        "The election commission met quietly",
        "   ",
    ];
    let posts = (1..=size)
        .map(|i| {
            let template = bodies[(i % bodies.len() as u64) as usize];
            let text = template.replace("{q}", &(i / 3 + 1).to_string());
            let ts = Utc
                .with_ymd_and_hms(2018, 1 + (i % 12) as u32, 1 + (i % 28) as u32, (i % 24) as u32, (i % 60) as u32, 0)
                .single();
            PostRecord::new(Some(i), ts, text)
        })
        .collect();
    PostStore::new(posts)
}

fn builder(parallel: bool) -> IndexBuilder {
    let symbols = SymbolCatalog::new()
        .with_symbol("XYZ", SymbolEntry::new(["xyz", "ex-why-zee"], "Example corp"))
        .with_symbol("ABC", SymbolEntry::new(["abc"], "Another corp"));
    IndexBuilder::new(&ThemeCatalog::default(), symbols)
        .unwrap()
        .with_parallel(parallel)
}

fn bench_build(c: &mut Criterion) {
    let store = setup_corpus(20_000);
    let serial = builder(false);
    let parallel = builder(true);

    c.bench_function("build_serial", |b| {
        b.iter(|| black_box(serial.build(black_box(&store))));
    });
    c.bench_function("build_parallel", |b| {
        b.iter(|| black_box(parallel.build(black_box(&store))));
    });
}

fn bench_cache(c: &mut Criterion) {
    let store = setup_corpus(20_000);
    let bundle = builder(true).build(&store);
    let path = std::env::temp_dir().join("postindex_bench_cache.bin");
    cache::save(&bundle, &path).unwrap();

    c.bench_function("cache_encode", |b| {
        b.iter(|| black_box(encode_bundle(black_box(&bundle)).unwrap()));
    });
    c.bench_function("cache_restore", |b| {
        b.iter(|| black_box(cache::load(&path).unwrap()));
    });

    let _ = std::fs::remove_file(&path);
}

criterion_group!(benches, bench_build, bench_cache);
criterion_main!(benches);
