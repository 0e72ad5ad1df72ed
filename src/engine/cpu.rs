//! CPU baselines for square matrix multiplication.
//!
//! Two host implementations used as references for GPU results and as
//! comparison points in benchmarks:
//!
//! * [`matmul_naive`]: single-threaded triple loop,
//! * [`matmul_blocked`]: cache-blocked and parallel over row blocks (rayon).
//!
//! Both write every element of `c`; prior contents are ignored.

use std::time::Instant;

use rayon::prelude::*;

use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::types::matrix_len;

/// Block edge for the cache-blocked kernel.
pub const CPU_BLOCK: usize = 32;

fn check_lengths(a: &[f32], b: &[f32], c: &[f32], size: u32) -> BridgeResult<usize> {
    let n = matrix_len(size);
    for (which, len) in [("a", a.len()), ("b", b.len()), ("c", c.len())] {
        if len != n {
            return Err(BridgeError::LengthMismatch { which, expected: n, actual: len });
        }
    }
    Ok(size as usize)
}

/// Single-threaded reference multiply.
pub fn matmul_naive(a: &[f32], b: &[f32], c: &mut [f32], size: u32) -> BridgeResult<()> {
    let n = check_lengths(a, b, c, size)?;
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0f32;
            for k in 0..n {
                sum += a[i * n + k] * b[k * n + j];
            }
            c[i * n + j] = sum;
        }
    }
    Ok(())
}

/// Cache-blocked multiply, parallel over blocks of [`CPU_BLOCK`] rows.
pub fn matmul_blocked(a: &[f32], b: &[f32], c: &mut [f32], size: u32) -> BridgeResult<()> {
    let n = check_lengths(a, b, c, size)?;

    c.par_chunks_mut(CPU_BLOCK * n)
        .enumerate()
        .for_each(|(block, rows)| {
            rows.fill(0.0);
            let i0 = block * CPU_BLOCK;
            let row_count = rows.len() / n;

            for k0 in (0..n).step_by(CPU_BLOCK) {
                let k1 = (k0 + CPU_BLOCK).min(n);
                for j0 in (0..n).step_by(CPU_BLOCK) {
                    let j1 = (j0 + CPU_BLOCK).min(n);
                    for ii in 0..row_count {
                        let a_row = &a[(i0 + ii) * n..(i0 + ii + 1) * n];
                        let c_row = &mut rows[ii * n..(ii + 1) * n];
                        for k in k0..k1 {
                            let aik = a_row[k];
                            let b_row = &b[k * n..(k + 1) * n];
                            for j in j0..j1 {
                                c_row[j] += aik * b_row[j];
                            }
                        }
                    }
                }
            }
        });

    Ok(())
}

/// Runs `f` and returns its wall-clock duration in milliseconds.
pub fn time_ms<F>(f: F) -> BridgeResult<f64>
where
    F: FnOnce() -> BridgeResult<()>,
{
    let start = Instant::now();
    f()?;
    Ok(start.elapsed().as_secs_f64() * 1000.0)
}
