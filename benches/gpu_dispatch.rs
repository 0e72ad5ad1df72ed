use criterion::*;
use std::hint::black_box;

use matmul_bridge::engine::config::BridgeConfig;
use matmul_bridge::gpu::context::GPUContext;
use matmul_bridge::gpu::dispatch::{encode_dispatch, read_back, submit_and_wait};
use matmul_bridge::gpu::pipeline::{build_pipeline, work_grid_for};
use matmul_bridge::gpu::program::load_program;
use matmul_bridge::gpu::resource::stage_buffers;

mod common;
use common::*;

/// Dispatch and readback only: device, pipeline and buffers are built once.
fn gpu_dispatch_hot_benchmark(c: &mut Criterion) {
    let config = BridgeConfig::default();
    if !gpu_available(&config) {
        return;
    }

    let context = GPUContext::new(config.backends).unwrap();
    let program = load_program(&config.kernel, &config.entry_point).unwrap();

    let mut group = c.benchmark_group("gpu_dispatch_hot");
    group.sample_size(20);

    for size in SIZES_LARGE {
        let mut ops = Operands::new(size);
        let work_grid = work_grid_for(&program, size).unwrap();
        let pipeline = build_pipeline(&context, &program, work_grid).unwrap();
        let buffers = stage_buffers(&context, &ops.a, &ops.b, size).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let commands = encode_dispatch(&context, &pipeline, &buffers).unwrap();
                black_box(submit_and_wait(&context, commands).unwrap());
                read_back(&context, &buffers, &mut ops.c).unwrap();
            });
        });
    }

    group.finish();
}

/// Device discovery and pipeline compilation, the fixed cost of every call.
fn gpu_startup_benchmark(c: &mut Criterion) {
    let config = BridgeConfig::default();
    if !gpu_available(&config) {
        return;
    }

    c.bench_function("gpu_cold_pipeline", |b| {
        b.iter(|| {
            let context = GPUContext::new(config.backends).unwrap();
            let program = load_program(&config.kernel, &config.entry_point).unwrap();
            let work_grid = work_grid_for(&program, 256).unwrap();
            black_box(build_pipeline(&context, &program, work_grid).unwrap());
        });
    });
}

criterion_group!(benches, gpu_dispatch_hot_benchmark, gpu_startup_benchmark);
criterion_main!(benches);
