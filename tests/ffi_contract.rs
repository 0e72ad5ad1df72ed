// Exercises the exported C entry points the way a ctypes host would.
//
//   cargo test --test ffi_contract -- --nocapture

use std::ptr;

use matmul_bridge::ffi::{
    get_gpu_time,
    get_naive_cpu_time,
    get_optimized_cpu_time,
    matmul_bridge_init_logging,
    matmul_naive,
    matmul_optimized,
    run_matmul,
    run_matmul_checked,
};
use matmul_bridge::MatmulStatus;

const A: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
const B: [f32; 4] = [5.0, 6.0, 7.0, 8.0];
const AB: [f32; 4] = [19.0, 22.0, 43.0, 50.0];

fn gpu_unavailable(status: i32) -> bool {
    status == MatmulStatus::NoDeviceFound as i32 || status == MatmulStatus::DeviceRequestFailed as i32
}

#[test]
fn checked_entry_computes_or_reports_missing_gpu() {
    matmul_bridge_init_logging();

    let mut c = [-1.0f32; 4];
    let mut ms = f64::NAN;
    // SAFETY: all buffers hold 2×2 floats; `ms` is writable.
    let status = unsafe { run_matmul_checked(A.as_ptr(), B.as_ptr(), c.as_mut_ptr(), 2, &mut ms) };

    if gpu_unavailable(status) {
        assert_eq!(c, [-1.0; 4]);
        assert!(ms.is_nan());
        return;
    }
    assert_eq!(status, MatmulStatus::Ok as i32);
    assert_eq!(c, AB);
    assert!(ms.is_finite() && ms >= 0.0);

    let mut last = f64::NAN;
    // SAFETY: `last` is writable.
    unsafe { get_gpu_time(&mut last) };
    assert!(last.is_finite() && last >= 0.0);
}

#[test]
fn legacy_entry_never_panics() {
    let mut c = [0.0f32; 4];
    // SAFETY: all buffers hold 2×2 floats.
    unsafe { run_matmul(A.as_ptr(), B.as_ptr(), c.as_mut_ptr(), 2) };
    assert!(c == AB || c == [0.0; 4], "partial write: {c:?}");

    // Rejected before any pointer is read.
    // SAFETY: null inputs are checked.
    unsafe { run_matmul(ptr::null(), ptr::null(), c.as_mut_ptr(), 2) };
    unsafe { run_matmul(A.as_ptr(), B.as_ptr(), c.as_mut_ptr(), -1) };
}

#[test]
fn checked_entry_rejects_bad_arguments() {
    let mut c = [9.0f32; 4];
    // SAFETY: size is rejected before any pointer is read.
    let status = unsafe { run_matmul_checked(A.as_ptr(), B.as_ptr(), c.as_mut_ptr(), 0, ptr::null_mut()) };
    assert_eq!(status, MatmulStatus::InvalidArgument as i32);

    // SAFETY: null output is rejected before any pointer is read.
    let status = unsafe { run_matmul_checked(A.as_ptr(), B.as_ptr(), ptr::null_mut(), 2, ptr::null_mut()) };
    assert_eq!(status, MatmulStatus::InvalidArgument as i32);
    assert_eq!(c, [9.0; 4]);
}

#[test]
fn cpu_baselines_agree() {
    let mut naive = [0.0f32; 4];
    let mut blocked = [0.0f32; 4];
    // SAFETY: all buffers hold 2×2 floats.
    unsafe {
        matmul_naive(A.as_ptr(), B.as_ptr(), naive.as_mut_ptr(), 2);
        matmul_optimized(A.as_ptr(), B.as_ptr(), blocked.as_mut_ptr(), 2);
    }
    assert_eq!(naive, AB);
    assert_eq!(blocked, AB);
}

#[test]
fn optimized_baseline_overwrites_stale_output() {
    let size = 40;
    let n = size * size;
    let a: Vec<f32> = (0..n).map(|i| (i % 7) as f32 - 3.0).collect();
    let b: Vec<f32> = (0..n).map(|i| (i % 5) as f32 - 2.0).collect();
    let mut expected = vec![0.0f32; n];
    let mut c = vec![1234.0f32; n];

    // SAFETY: all buffers hold size×size floats.
    unsafe {
        let t0 = get_naive_cpu_time(a.as_ptr(), b.as_ptr(), expected.as_mut_ptr(), size as i32);
        let t1 = get_optimized_cpu_time(a.as_ptr(), b.as_ptr(), c.as_mut_ptr(), size as i32);
        assert!(t0 >= 0.0 && t1 >= 0.0);
    }
    assert_eq!(c, expected);
}

#[test]
fn gpu_time_accepts_null() {
    // SAFETY: null is allowed.
    unsafe { get_gpu_time(ptr::null_mut()) };
}
