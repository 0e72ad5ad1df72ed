//! # matmul_bridge
//!
//! Offloads a dense, square `f32` matrix multiplication to a GPU compute
//! device via `wgpu` and returns the result and its dispatch time to the
//! caller.
//!
//! ## Design Goals
//! - One kernel shape, one blocking call pattern
//! - Explicit per-call results: output plus timing, or a typed error
//! - Kernel location as configuration, never a path baked into the logic
//! - A flat C ABI for non-Rust hosts
//!
//! This crate builds as both:
//! - `rlib` (for Rust usage & integration tests)
//! - `cdylib` (for FFI / DLL usage, see [`ffi`])
//!
//! ```no_run
//! use matmul_bridge::{run_matmul, BridgeConfig};
//!
//! let a = [1.0, 2.0, 3.0, 4.0];
//! let b = [5.0, 6.0, 7.0, 8.0];
//! let mut c = [0.0; 4];
//! let report = run_matmul(&BridgeConfig::default(), &a, &b, &mut c, 2)?;
//! assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
//! println!("{:.3} ms on {}", report.elapsed_ms, report.adapter);
//! # Ok::<(), matmul_bridge::BridgeError>(())
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![deny(dead_code)]

pub mod engine;
pub mod gpu;
pub mod ffi;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::config::{
    BridgeConfig,
    KernelSource,
};

pub use engine::error::{
    BridgeError,
    BridgeResult,
    MatmulStatus,
};

pub use engine::types::{
    CallState,
    Extent3,
    WorkGrid,
};

pub use engine::timing::last_gpu_time_ms;

pub use gpu::{
    run_matmul,
    MatmulReport,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use matmul_bridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        run_matmul,
        BridgeConfig,
        BridgeError,
        BridgeResult,
        KernelSource,
        MatmulReport,
        WorkGrid,
    };
}
