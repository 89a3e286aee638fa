use bsdelta::delta;
use bsdelta::format;
use bsdelta::suffix::sort_suffixes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = vec![0u8; size];
    rng.fill(&mut out[..]);
    out
}

/// Text-like data: random words from a small vocabulary.
fn gen_text(size: usize, seed: u64) -> Vec<u8> {
    const WORDS: &[&[u8]] = &[
        b"delta ", b"patch ", b"suffix ", b"array ", b"control ", b"stream ", b"old ", b"new ",
    ];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(size + 16);
    while out.len() < size {
        out.extend_from_slice(WORDS[rng.random_range(0..WORDS.len())]);
    }
    out.truncate(size);
    out
}

fn mutate(base: &[u8], stride: usize) -> Vec<u8> {
    let mut out = base.to_vec();
    for i in (0..out.len()).step_by(stride.max(1)) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

fn write_ratio_snapshot() {
    let old = gen_data(1024 * 1024, 123);
    let mut csv = String::from("stride,patch_bytes,new_bytes,ratio\n");
    for stride in [64usize, 512, 4096, 32768] {
        let new = mutate(&old, stride);
        let d = delta::diff(&old, &new).unwrap();
        let patch = format::serialize(&d).unwrap();
        let ratio = patch.len() as f64 / new.len() as f64;
        csv.push_str(&format!("{stride},{},{},{}\n", patch.len(), new.len(), ratio));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_suffix_sort(c: &mut Criterion) {
    let mut g = c.benchmark_group("suffix_sort");
    for size in [64 * 1024, 512 * 1024] {
        let random = gen_data(size, 1);
        let text = gen_text(size, 2);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::new("random", size), &random, |b, data| {
            b.iter(|| black_box(sort_suffixes(black_box(data)).unwrap()));
        });
        g.bench_with_input(BenchmarkId::new("text", size), &text, |b, data| {
            b.iter(|| black_box(sort_suffixes(black_box(data)).unwrap()));
        });
    }
    g.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut g = c.benchmark_group("diff_mb_s");
    g.sample_size(10);
    for size in [64 * 1024, 1024 * 1024] {
        let old = gen_data(size, 7);
        let new = mutate(&old, 4096);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(delta::diff(black_box(&old), black_box(&new)).unwrap()));
        });
    }
    g.finish();
}

fn bench_patch(c: &mut Criterion) {
    let mut g = c.benchmark_group("patch_mb_s");
    for size in [64 * 1024, 1024 * 1024] {
        let old = gen_text(size, 9);
        let new = mutate(&old, 1024);
        let d = delta::diff(&old, &new).unwrap();
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(delta::patch(black_box(&old), black_box(&d)).unwrap()));
        });
    }
    g.finish();
}

fn bench_container(c: &mut Criterion) {
    let old = gen_text(256 * 1024, 11);
    let new = mutate(&old, 2048);
    let d = delta::diff(&old, &new).unwrap();
    let bytes = format::serialize(&d).unwrap();

    let mut g = c.benchmark_group("container");
    g.bench_function("serialize", |b| {
        b.iter(|| black_box(format::serialize(black_box(&d)).unwrap()));
    });
    g.bench_function("deserialize", |b| {
        b.iter(|| black_box(format::deserialize(black_box(&bytes)).unwrap()));
    });
    g.finish();
}

fn bench_reports(c: &mut Criterion) {
    write_ratio_snapshot();
    c.bench_function("reports_written", |b| b.iter(|| black_box(1)));
}

criterion_group!(
    benches,
    bench_suffix_sort,
    bench_diff,
    bench_patch,
    bench_container,
    bench_reports,
);
criterion_main!(benches);
