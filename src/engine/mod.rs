//! # Engine Module
//!
//! Host-side building blocks that do not touch the GPU:
//! - Error taxonomy and FFI status codes
//! - Work grid, size validation and the uniform params block
//! - Configuration (kernel location, entry point, backends)
//! - Dispatch timing cells
//! - CPU baselines
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod config;
pub mod timing;
pub mod cpu;
