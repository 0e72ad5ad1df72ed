use criterion::*;
use std::hint::black_box;

use matmul_bridge::engine::cpu::{matmul_blocked, matmul_naive};
use matmul_bridge::{run_matmul, BridgeConfig};

mod common;
use common::*;

fn cpu_matmul_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_matmul");
    group.sample_size(10);

    for size in SIZES_SMALL {
        let mut ops = Operands::new(size);
        group.throughput(Throughput::Elements(size as u64 * size as u64));

        group.bench_with_input(BenchmarkId::new("naive", size), &size, |b, &size| {
            b.iter(|| {
                matmul_naive(&ops.a, &ops.b, &mut ops.c, size).unwrap();
                black_box(&ops.c);
            });
        });

        group.bench_with_input(BenchmarkId::new("blocked", size), &size, |b, &size| {
            b.iter(|| {
                matmul_blocked(&ops.a, &ops.b, &mut ops.c, size).unwrap();
                black_box(&ops.c);
            });
        });
    }

    group.finish();
}

fn gpu_matmul_benchmark(c: &mut Criterion) {
    let config = BridgeConfig::default();
    if !gpu_available(&config) {
        return;
    }

    let mut group = c.benchmark_group("gpu_matmul");
    group.sample_size(10);

    for size in SIZES_SMALL.into_iter().chain(SIZES_LARGE) {
        let mut ops = Operands::new(size);
        group.throughput(Throughput::Elements(size as u64 * size as u64));

        group.bench_with_input(BenchmarkId::new("end_to_end", size), &size, |b, &size| {
            b.iter(|| {
                run_matmul(&config, &ops.a, &ops.b, &mut ops.c, size as u64).unwrap();
                black_box(&ops.c);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, cpu_matmul_benchmark, gpu_matmul_benchmark);
criterion_main!(benches);
