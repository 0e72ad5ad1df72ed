#![allow(dead_code)]

use matmul_bridge::{run_matmul, BridgeConfig, BridgeError, BridgeResult, MatmulReport};

/// Absolute tolerance per unit of `size` when comparing GPU output to the
/// CPU reference. GPU accumulation order differs, so exact equality is only
/// expected for small integer-valued inputs.
pub const TOLERANCE_PER_EDGE: f32 = 1e-4;

/// Deterministic matrix with values in `[-2, 3)`.
pub fn pattern(size: u32, seed: f32) -> Vec<f32> {
    (0..size as usize * size as usize)
        .map(|i| ((i as f32 * 0.37 + seed) % 5.0) - 2.0)
        .collect()
}

pub fn identity(size: u32) -> Vec<f32> {
    let n = size as usize;
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

/// Returns `None` (and says so) when the machine has no usable adapter.
pub fn skip_without_gpu<T>(result: BridgeResult<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e @ (BridgeError::NoDeviceFound | BridgeError::DeviceRequestFailed { .. })) => {
            eprintln!("skipping: {e}");
            None
        }
        Err(e) => panic!("unexpected error: {e}"),
    }
}

/// Runs one GPU multiply, returning `None` when no GPU is available.
pub fn gpu_multiply(config: &BridgeConfig, a: &[f32], b: &[f32], size: u32) -> Option<(Vec<f32>, MatmulReport)> {
    let mut out = vec![0.0; size as usize * size as usize];
    let report = skip_without_gpu(run_matmul(config, a, b, &mut out, size as u64))?;
    Some((out, report))
}

pub fn cpu_reference(a: &[f32], b: &[f32], size: u32) -> Vec<f32> {
    let mut out = vec![0.0; size as usize * size as usize];
    matmul_bridge::engine::cpu::matmul_naive(a, b, &mut out, size).unwrap();
    out
}

pub fn assert_close(actual: &[f32], expected: &[f32], size: u32) {
    assert_eq!(actual.len(), expected.len());
    let tol = TOLERANCE_PER_EDGE * size as f32;
    for (i, (x, y)) in actual.iter().zip(expected).enumerate() {
        let (row, col) = (i / size as usize, i % size as usize);
        assert!(
            (x - y).abs() <= tol * y.abs().max(1.0),
            "mismatch at ({row}, {col}): gpu {x} vs cpu {y}"
        );
    }
}
