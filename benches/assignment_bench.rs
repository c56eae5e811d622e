use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stickler::solve_assignment;

/// Deterministic pseudo-random similarity matrix; no RNG dependency so the
/// benchmark input is identical across runs.
fn similarity_matrix(rows: usize, cols: usize) -> Vec<Vec<f64>> {
    let mut state = 0x9e3779b97f4a7c15_u64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 1000) as f64 / 1000.0
    };
    (0..rows)
        .map(|_| (0..cols).map(|_| next()).collect())
        .collect()
}

fn bench_square_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment_square");
    for size in [8usize, 32, 128] {
        let matrix = similarity_matrix(size, size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &matrix, |b, matrix| {
            b.iter(|| solve_assignment(black_box(matrix)));
        });
    }
    group.finish();
}

fn bench_rectangular(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment_rectangular");
    let matrix = similarity_matrix(32, 128);
    group.bench_function("32x128", |b| {
        b.iter(|| solve_assignment(black_box(&matrix)));
    });
    let matrix = similarity_matrix(128, 32);
    group.bench_function("128x32", |b| {
        b.iter(|| solve_assignment(black_box(&matrix)));
    });
    group.finish();
}

criterion_group!(benches, bench_square_sizes, bench_rectangular);
criterion_main!(benches);
