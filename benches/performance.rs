//! Performance benchmarks for the configuration store
//!
//! Parse, lookup, update and render over synthetic files of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keyval_config::{ConfigStore, Logger};
use std::io::Cursor;

/// Build a file body with `count` pairs and a comment every tenth line
fn create_sample_file(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        if i % 10 == 0 {
            text.push_str(&format!("# section {}\n", i / 10));
        }
        text.push_str(&format!("   KEY_{}=value number {} with spaces  \n", i, i));
    }
    text
}

fn quiet_store() -> ConfigStore {
    ConfigStore::new().with_logger(Logger::capturing("bench".to_string()))
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for size in [10, 100, 1000, 10000] {
        let text = create_sample_file(size);
        group.bench_with_input(BenchmarkId::new("read_from", size), &text, |b, text| {
            b.iter(|| {
                let mut store = quiet_store();
                let report = store.read_from(Cursor::new(black_box(text.as_str()))).unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let mut store = quiet_store();
    store.read_from(Cursor::new(create_sample_file(10000))).unwrap();

    group.bench_function("get_hit", |b| {
        b.iter(|| black_box(store.get(black_box("KEY_7777")).unwrap()));
    });

    group.bench_function("get_miss", |b| {
        b.iter(|| black_box(store.get(black_box("MISSING")).is_err()));
    });

    group.bench_function("read_value", |b| {
        let mut buf = [0u8; 64];
        b.iter(|| black_box(store.read_value(black_box("KEY_42"), &mut buf).unwrap()));
    });

    group.finish();
}

fn benchmark_update_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_render");

    group.bench_function("set_new_keys_1000", |b| {
        b.iter(|| {
            let mut store = quiet_store();
            for i in 0..1000 {
                store.set(&format!("k{}", i), "v").unwrap();
            }
            black_box(store.len());
        });
    });

    let mut store = quiet_store();
    store.read_from(Cursor::new(create_sample_file(1000))).unwrap();

    group.bench_function("set_existing_key", |b| {
        b.iter(|| store.set(black_box("KEY_500"), black_box("updated")).unwrap());
    });

    group.bench_function("render_1000", |b| {
        b.iter(|| black_box(store.render()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_lookup,
    benchmark_update_and_render
);

criterion_main!(benches);
