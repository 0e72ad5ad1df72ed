//! C ABI for host callers (Python `ctypes`, C, Swift, ...).
//!
//! ```c
//! float a[4] = {1, 2, 3, 4}, b[4] = {5, 6, 7, 8}, c[4];
//! double ms;
//! int32_t status = run_matmul_checked(a, b, c, 2, &ms);   // c = {19, 22, 43, 50}
//!
//! run_matmul(a, b, c, 2);                                  // legacy, no status
//! get_gpu_time(&ms);
//! ```
//!
//! Configuration is read from the environment on every call (see
//! [`BridgeConfig::from_env`]). No entry point lets a panic unwind into the
//! caller.

use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::engine::config::BridgeConfig;
use crate::engine::cpu;
use crate::engine::error::{BridgeError, BridgeResult, MatmulStatus};
use crate::engine::timing::last_gpu_time_ms;
use crate::engine::types::{checked_size, matrix_len};
use crate::gpu::dispatch;

/// Borrowed host matrices for one call.
struct HostMatrices<'a> {
    a: &'a [f32],
    b: &'a [f32],
    c: &'a mut [f32],
    size: u32,
}

/// Validates raw pointers and builds slices over them.
///
/// # Safety
/// If all pointers are non-null, each must point to at least `size * size`
/// valid floats, `c` writable and not aliasing `a` or `b`.
unsafe fn host_matrices<'a>(
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    size: i64,
) -> BridgeResult<HostMatrices<'a>> {
    if size < 1 {
        return Err(BridgeError::InvalidSize { size: size.max(0) as u64 });
    }
    let size = checked_size(size as u64)?;
    for (which, null) in [("a", a.is_null()), ("b", b.is_null()), ("c", c.is_null())] {
        if null {
            return Err(BridgeError::NullPointer { which });
        }
    }
    let n = matrix_len(size);
    // SAFETY: non-null and sized per the caller contract above.
    unsafe {
        Ok(HostMatrices {
            a: std::slice::from_raw_parts(a, n),
            b: std::slice::from_raw_parts(b, n),
            c: std::slice::from_raw_parts_mut(c, n),
            size,
        })
    }
}

fn guarded<T>(what: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!(entry_point = what, "panic caught at ffi boundary");
        fallback
    })
}

fn gpu_matmul(m: HostMatrices<'_>) -> BridgeResult<f64> {
    let config = BridgeConfig::from_env();
    dispatch::run_matmul(&config, m.a, m.b, m.c, m.size as u64).map(|report| report.elapsed_ms)
}

/// Multiplies `in_a * in_b` into `out_c` on the GPU.
///
/// On any failure `out_c` is left untouched and the reason is logged; use
/// [`run_matmul_checked`] to receive a status code instead.
///
/// # Safety
/// `in_a`, `in_b` must point to `size * size` readable floats and `out_c` to
/// `size * size` writable floats.
#[no_mangle]
pub unsafe extern "C" fn run_matmul(in_a: *const f32, in_b: *const f32, out_c: *mut f32, size: isize) {
    guarded("run_matmul", (), || {
        // SAFETY: forwarded caller contract.
        let result = unsafe { host_matrices(in_a, in_b, out_c, size as i64) }.and_then(gpu_matmul);
        if let Err(e) = result {
            tracing::error!(error = %e, "run_matmul failed; output left untouched");
        }
    })
}

/// Like [`run_matmul`], but returns a [`MatmulStatus`] code and writes the
/// dispatch time of this call to `out_elapsed_ms` (if non-null, on success).
///
/// # Safety
/// Same as [`run_matmul`]; `out_elapsed_ms` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn run_matmul_checked(
    in_a: *const f32,
    in_b: *const f32,
    out_c: *mut f32,
    size: isize,
    out_elapsed_ms: *mut f64,
) -> i32 {
    guarded("run_matmul_checked", MatmulStatus::Internal as i32, || {
        // SAFETY: forwarded caller contract.
        let result = unsafe { host_matrices(in_a, in_b, out_c, size as i64) }.and_then(gpu_matmul);
        match &result {
            Ok(ms) if !out_elapsed_ms.is_null() => {
                // SAFETY: non-null and writable per the caller contract.
                unsafe { *out_elapsed_ms = *ms };
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "run_matmul_checked failed"),
        }
        MatmulStatus::from(&result) as i32
    })
}

/// Writes the most recent dispatch duration (ms) to `out_time`.
///
/// The value is NaN if no dispatch has completed in this process. A null
/// `out_time` is ignored.
///
/// # Safety
/// `out_time` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn get_gpu_time(out_time: *mut f64) {
    if out_time.is_null() {
        return;
    }
    // SAFETY: checked non-null; writable per the caller contract.
    unsafe { *out_time = last_gpu_time_ms() };
}

// ─────────────────────────────────────────────────────────────────────────────
// CPU baselines
// ─────────────────────────────────────────────────────────────────────────────

/// # Safety
/// Same pointer contract as [`run_matmul`].
unsafe fn cpu_call(
    what: &'static str,
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    size: c_int,
    kernel: fn(&[f32], &[f32], &mut [f32], u32) -> BridgeResult<()>,
) -> BridgeResult<f64> {
    // SAFETY: forwarded caller contract.
    unsafe { host_matrices(a, b, c, size as i64) }
        .and_then(|m| cpu::time_ms(|| kernel(m.a, m.b, m.c, m.size)))
        .inspect_err(|e| {
            tracing::error!(entry_point = what, error = %e, "cpu matmul failed; output left untouched");
        })
}

/// Single-threaded CPU multiply.
///
/// # Safety
/// Same pointer contract as [`run_matmul`].
#[no_mangle]
pub unsafe extern "C" fn matmul_naive(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    guarded("matmul_naive", (), || {
        // SAFETY: forwarded caller contract.
        let _ = unsafe { cpu_call("matmul_naive", a, b, c, size, cpu::matmul_naive) };
    })
}

/// Cache-blocked, multi-threaded CPU multiply.
///
/// # Safety
/// Same pointer contract as [`run_matmul`].
#[no_mangle]
pub unsafe extern "C" fn matmul_optimized(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    guarded("matmul_optimized", (), || {
        // SAFETY: forwarded caller contract.
        let _ = unsafe { cpu_call("matmul_optimized", a, b, c, size, cpu::matmul_blocked) };
    })
}

/// Runs [`matmul_naive`] and returns its duration in ms (NaN on failure).
///
/// # Safety
/// Same pointer contract as [`run_matmul`].
#[no_mangle]
pub unsafe extern "C" fn get_naive_cpu_time(a: *const f32, b: *const f32, c: *mut f32, size: c_int) -> f64 {
    guarded("get_naive_cpu_time", f64::NAN, || {
        // SAFETY: forwarded caller contract.
        unsafe { cpu_call("get_naive_cpu_time", a, b, c, size, cpu::matmul_naive) }.unwrap_or(f64::NAN)
    })
}

/// Runs [`matmul_optimized`] and returns its duration in ms (NaN on failure).
///
/// # Safety
/// Same pointer contract as [`run_matmul`].
#[no_mangle]
pub unsafe extern "C" fn get_optimized_cpu_time(
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    size: c_int,
) -> f64 {
    guarded("get_optimized_cpu_time", f64::NAN, || {
        // SAFETY: forwarded caller contract.
        unsafe { cpu_call("get_optimized_cpu_time", a, b, c, size, cpu::matmul_blocked) }.unwrap_or(f64::NAN)
    })
}

/// Installs a `tracing` subscriber that prints to stderr, filtered by
/// `RUST_LOG` (default `info`). Safe to call more than once.
#[no_mangle]
pub extern "C" fn matmul_bridge_init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
