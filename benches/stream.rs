//! A benchmark for the streaming interface.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fastlzlib::full::{compress_chunked, decompress_chunked};
use fastlzlib::{Context, DEFAULT_BLOCK_SIZE};

fn get_text(len: usize) -> Vec<u8> {
    let mut input = Vec::new();
    let mut i = 0;
    while input.len() < len {
        let line = format!("{} bottles of beer on the wall\n", i % 100);
        input.extend_from_slice(line.as_bytes());
        i += 1;
    }
    input
}

fn compress_large_chunks() {
    let input = get_text(1_000_000);
    let ctx = Context::new(9, DEFAULT_BLOCK_SIZE);
    black_box(compress_chunked(&input, ctx, 1 << 16, 1 << 16).unwrap());
}

fn compress_small_chunks() {
    let input = get_text(1_000_000);
    let ctx = Context::new(9, DEFAULT_BLOCK_SIZE);
    black_box(compress_chunked(&input, ctx, 1000, 1000).unwrap());
}

fn decompress_small_chunks() {
    let input = get_text(1_000_000);
    let ctx = Context::new(9, DEFAULT_BLOCK_SIZE);
    let compressed = compress_chunked(&input, ctx, 1 << 16, 1 << 16).unwrap();
    let block_size = DEFAULT_BLOCK_SIZE;
    let output = decompress_chunked(&compressed, block_size, 1000, 1000);
    black_box(output.unwrap());
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("compress_large_chunks", |b| {
        b.iter(compress_large_chunks)
    });
    c.bench_function("compress_small_chunks", |b| {
        b.iter(compress_small_chunks)
    });
    c.bench_function("decompress_small_chunks", |b| {
        b.iter(decompress_small_chunks)
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
