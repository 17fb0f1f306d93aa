use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::rngs::SmallRng;

use segrope::SegRope;

const EDIT_COUNT: usize = 10_000;

fn append_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Elements(EDIT_COUNT as u64));

    group.bench_function("push_str", |b| {
        b.iter(|| {
            let mut r = SegRope::new();
            for _ in 0..EDIT_COUNT {
                r.push_str("the quick brown fox ");
            }
            black_box(r.len())
        })
    });

    group.bench_function("insert_at_end", |b| {
        b.iter(|| {
            let mut r = SegRope::new();
            for _ in 0..EDIT_COUNT {
                r.insert_at(usize::MAX, "the quick brown fox ");
            }
            black_box(r.len())
        })
    });

    group.finish();
}

fn random_insert_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_insert");
    group.throughput(Throughput::Elements(EDIT_COUNT as u64));

    for (name, max_leaf, max_root) in [
        ("leaf128_root512", 128, 512),
        ("leaf64_root4096", 64, 4096),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(), |b, _| {
            b.iter(|| {
                let mut r = SegRope::with_bounds(max_leaf, max_root);
                let mut rng = SmallRng::seed_from_u64(123);
                for _ in 0..EDIT_COUNT {
                    let at = rng.gen_range(0..=r.len());
                    r.insert_at(at, "abcdefg");
                }
                black_box(r.len())
            })
        });
    }

    group.finish();
}

fn scan_benchmarks(c: &mut Criterion) {
    let mut r = SegRope::new();
    for _ in 0..2_000 {
        r.push_str("pack my box with five dozen liquor jugs ");
    }
    let total = r.len();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(total as u64));

    group.bench_function("chars_forward", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for c in r.chars() {
                n += c.len_utf8();
            }
            black_box(n)
        })
    });

    group.bench_function("chars_backward", |b| {
        b.iter(|| black_box(r.chars_rev().count()))
    });

    group.bench_function("char_at_random", |b| {
        let mut rng = SmallRng::seed_from_u64(321);
        b.iter(|| {
            let at = rng.gen_range(0..total);
            black_box(r.char_at(at).unwrap())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    append_benchmarks,
    random_insert_benchmarks,
    scan_benchmarks
);
criterion_main!(benches);
