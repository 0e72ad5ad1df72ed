//! # GPU Execution Backend
//!
//! Offloads one square matrix multiply to a compute device through `wgpu`.
//!
//! ## High-level execution model
//!
//! A call proceeds through **six stages**, strictly in order:
//!
//! 1. **Device** ([`context`]): first adapter for the configured backends,
//!    opened fresh for this call.
//! 2. **Program** ([`program`]): kernel module parsed to naga IR, entry point
//!    resolved.
//! 3. **Pipeline** ([`pipeline`]): compute pipeline with the fixed four-slot
//!    bind group layout.
//! 4. **Buffers** ([`resource`]): host matrices copied in, output and
//!    readback allocated.
//! 5. **Dispatch** ([`dispatch`]): `ceil(size / tile)` workgroups per axis.
//! 6. **Synchronization** ([`dispatch`]): blocking wait, timing, readback.
//!
//! Nothing is cached between calls and nothing is retried within one.
//!
//! ## Safety and correctness
//!
//! * Every device-side failure is captured with an error scope and surfaced as
//!   a [`BridgeError`](crate::engine::error::BridgeError).
//! * Synchronization is explicit (`Device::poll`) and never implicit.
//! * The host output slice is written only after a successful wait.
//!
//! ## Public API
//!
//! * [`run_matmul`]: runs the whole pipeline for one call

pub mod context;
pub mod program;
pub mod pipeline;
pub mod resource;
pub mod dispatch;

pub use context::GPUContext;
pub use dispatch::{run_matmul, MatmulReport};
